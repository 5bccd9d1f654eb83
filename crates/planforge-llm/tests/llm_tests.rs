//! Tests for planforge-llm: generator trait objects and cache interplay

use planforge_llm::{GenerationOptions, ResponseCache, StaticGenerator, TextGenerator};
use std::sync::Arc;

#[tokio::test]
async fn static_generator_works_as_trait_object() {
    let generator: Arc<dyn TextGenerator> = Arc::new(StaticGenerator::new());
    let prompt = "contract please\n```json\n{\"name\": \"indexing\", \"objective\": \"index the archive\"}\n```\n";
    let text = generator
        .complete(prompt, &GenerationOptions::default())
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["enhancement_area"], "indexing");
    assert_eq!(parsed["objective"], "index the archive");
    assert!(parsed["implementation_plan"]["modules"].is_array());
}

#[tokio::test]
async fn options_change_the_cache_key_but_not_static_output() {
    let generator = StaticGenerator::new();
    let prompt = "```json\n{\"name\": \"x\", \"objective\": \"y\"}\n```";

    let default_opts = GenerationOptions::default();
    let tuned = GenerationOptions {
        model: Some("bigger".into()),
        max_tokens: Some(2048),
        temperature: Some(0.7),
    };

    assert_ne!(
        ResponseCache::key(prompt, &default_opts),
        ResponseCache::key(prompt, &tuned)
    );

    let a = generator.complete(prompt, &default_opts).await.unwrap();
    let b = generator.complete(prompt, &tuned).await.unwrap();
    assert_eq!(a, b);
}

#[test]
fn options_serialize_sparsely() {
    let json = serde_json::to_value(GenerationOptions::default()).unwrap();
    assert_eq!(json, serde_json::json!({}));
}
