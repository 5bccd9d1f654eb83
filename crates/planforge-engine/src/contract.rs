//! Contract generation
//!
//! Builds the generation prompt for an area, calls the text-generation
//! collaborator, and parses the response into a closed AgentContract
//! record. Parse and schema failures are permanent for the given input;
//! only transport failures are transient.

use planforge_core::{AgentContract, EnhancementArea, Error, PolicyDecision, Result, Route};
use planforge_llm::{GenerationOptions, TextGenerator};
use std::sync::Arc;
use tracing::debug;

pub struct ContractGenerator {
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
}

impl ContractGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// The prompt embeds the area record as a fenced JSON block so every
    /// generator (remote or static) works from the same structured input.
    pub fn build_prompt(area: &EnhancementArea, decision: &PolicyDecision) -> String {
        let header = match decision.route {
            Route::Agent => format!(
                "You are specialist worker '{}'. Produce the implementation contract \
                 for the enhancement area below.",
                decision.agent_id.as_deref().unwrap_or("unknown"),
            ),
            _ => "Produce the implementation contract for the enhancement area below."
                .to_string(),
        };
        let area_json = serde_json::to_string_pretty(area).unwrap_or_default();
        format!(
            "{header}\n\n```json\n{area_json}\n```\n\n\
             Respond with a single JSON object with exactly these fields: \
             enhancement_area, objective, implementation_plan {{modules, architecture}}, \
             depends_on, sources, governance {{security, compliance, ethics}}, \
             validation_criteria, confidence_score. No other fields, no prose.",
        )
    }

    pub async fn generate(
        &self,
        area: &EnhancementArea,
        decision: &PolicyDecision,
    ) -> Result<AgentContract> {
        let prompt = Self::build_prompt(area, decision);
        let text = self
            .generator
            .complete(&prompt, &self.options)
            .await
            .map_err(|e| {
                Error::external(self.generator.name(), e.to_string(), e.is_transient())
            })?;

        debug!(area = %area.name, bytes = text.len(), "generator responded");
        Self::parse(&text, area)
    }

    /// Strict boundary parse: unknown fields rejected, required fields
    /// checked, the area name echoed back, declared dependencies
    /// authoritative.
    fn parse(text: &str, area: &EnhancementArea) -> Result<AgentContract> {
        let json = extract_json(text).ok_or_else(|| {
            Error::validation(&area.name, "generator response carries no JSON object")
        })?;

        let mut contract: AgentContract = serde_json::from_str(json)
            .map_err(|e| Error::validation(&area.name, format!("contract schema: {}", e)))?;

        if contract.enhancement_area != area.name {
            return Err(Error::validation(
                &area.name,
                format!(
                    "contract names area '{}' instead of '{}'",
                    contract.enhancement_area, area.name
                ),
            ));
        }

        // The batch document, not the generator, owns the dependency list.
        contract.depends_on = area.depends_on.clone();

        contract.validate()?;
        Ok(contract)
    }
}

/// Pull the first JSON object out of a response that may wrap it in
/// markdown fences or prose.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
