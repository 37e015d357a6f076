use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::slots::OutputSlot;

/// Name of the fallback agent that answers directly when no specialist
/// matches. It produces no slot output.
pub const ORCHESTRATOR: &str = "orchestrator";

/// Static configuration for one agent: a hosted-model binding, an
/// instruction template, the slot it produces, and the slots it reads.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub model: String,
    pub description: String,
    pub instruction: String,
    pub output_slot: Option<OutputSlot>,
    pub reads: Vec<OutputSlot>,
}

/// Mapping from agent name to its configuration. Pure configuration, no
/// behavior beyond startup validation.
pub struct AgentRegistry {
    agents: Vec<AgentSpec>,
}

impl AgentRegistry {
    pub fn new(agents: Vec<AgentSpec>) -> Self {
        Self { agents }
    }

    /// The built-in content-creation pipeline: five specialists plus the
    /// orchestrator fallback, all bound to the same model.
    pub fn builtin(model: &str) -> Self {
        let agent = |name: &str, description: &str, instruction: &str, output: OutputSlot, reads: &[OutputSlot]| AgentSpec {
            name: name.into(),
            model: model.into(),
            description: description.into(),
            instruction: instruction.into(),
            output_slot: Some(output),
            reads: reads.to_vec(),
        };

        Self::new(vec![
            agent(
                "ideate",
                "Generates creative ideas from a topic or theme",
                IDEATE_INSTRUCTION,
                OutputSlot::Ideas,
                &[OutputSlot::Ideas],
            ),
            agent(
                "outline",
                "Structures ideas into a detailed content outline",
                OUTLINE_INSTRUCTION,
                OutputSlot::Outline,
                &[OutputSlot::Ideas, OutputSlot::Outline],
            ),
            agent(
                "draft",
                "Writes a complete content draft from an outline",
                DRAFT_INSTRUCTION,
                OutputSlot::Draft,
                &[OutputSlot::Outline, OutputSlot::Draft],
            ),
            agent(
                "feedback",
                "Reviews content and gives expert, point-based feedback",
                FEEDBACK_INSTRUCTION,
                OutputSlot::Feedback,
                &[OutputSlot::Draft],
            ),
            agent(
                "seo",
                "Optimizes content for search engines",
                SEO_INSTRUCTION,
                OutputSlot::SeoResult,
                &[OutputSlot::Draft],
            ),
            AgentSpec {
                name: ORCHESTRATOR.into(),
                model: model.into(),
                description: "Answers directly when no specialist clearly matches".into(),
                instruction: ORCHESTRATOR_INSTRUCTION.into(),
                output_slot: None,
                reads: Vec::new(),
            },
        ])
    }

    pub fn get(&self, name: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentSpec> {
        self.agents.iter()
    }

    /// Specialists only (agents that produce a slot).
    pub fn specialists(&self) -> impl Iterator<Item = &AgentSpec> {
        self.agents.iter().filter(|a| a.output_slot.is_some())
    }

    pub fn producer_of(&self, slot: OutputSlot) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.output_slot == Some(slot))
    }

    /// Startup check: the slot-to-producer mapping must be fixed and
    /// exhaustive (each slot has exactly one producer), and the
    /// orchestrator fallback must exist so routing stays total.
    pub fn validate(&self) -> Result<()> {
        let mut producers: HashMap<OutputSlot, &str> = HashMap::new();
        for agent in &self.agents {
            if let Some(slot) = agent.output_slot {
                if let Some(existing) = producers.insert(slot, &agent.name) {
                    return Err(Error::Configuration(format!(
                        "slot '{slot}' has two producers: '{existing}' and '{}'",
                        agent.name
                    )));
                }
            }
        }
        for slot in OutputSlot::ALL {
            if !producers.contains_key(&slot) {
                return Err(Error::Configuration(format!(
                    "slot '{slot}' has no producing agent"
                )));
            }
        }
        match self.get(ORCHESTRATOR) {
            None => Err(Error::Configuration(
                "no orchestrator agent registered for fallback routing".into(),
            )),
            Some(agent) if agent.output_slot.is_some() => Err(Error::Configuration(
                "the orchestrator must not declare an output slot".into(),
            )),
            Some(_) => Ok(()),
        }
    }
}

const IDEATE_INSTRUCTION: &str = "\
You are an expert idea generator creating compelling, relevant content ideas.

When the user provides a topic, theme, or general concept:
1. Generate 3-5 creative and distinct ideas
2. Consider different angles and target-audience relevance
3. Keep ideas actionable and concrete
4. Add a brief (10-20 word) explanation per idea
5. Keep the whole response between 120 and 160 words

Format the response as a structured list with idea titles, and name the
strongest idea as the main concept for further development.";

const OUTLINE_INSTRUCTION: &str = "\
You are a professional content structuring expert creating detailed,
logical outlines.

You will receive either a user-provided idea, previously generated ideas,
or an existing outline the user wants improved. Produce an outline with:
1. Clear main sections and headings
2. One or two supporting points per section
3. Logical flow from introduction to conclusion
4. No more than 250 words total

Format as a hierarchical structure with main points and sub-points,
detailed enough to guide drafting without padding.";

const DRAFT_INSTRUCTION: &str = "\
You are an experienced content writer producing well-written, engaging
drafts.

Work from the outline if one is provided. Write:
1. A compelling introduction that hooks the reader
2. Body sections following the outline structure, with smooth transitions
3. A strong conclusion reinforcing the key points

If a previous draft is provided and the user asks for a revision,
incorporate their suggestions into the new version rather than starting
over. Match length to the content type: blog post 600-700 words, LinkedIn
post 200-350 words, tweet 80-120 words. Write in a natural, conversational
style unless the user specifies otherwise.";

const FEEDBACK_INSTRUCTION: &str = "\
You are an expert content reviewer with deep domain knowledge.

When a draft is provided, review it: overall assessment, specific strengths
and areas for improvement, and concrete suggestions covering clarity,
engagement, and structure. Keep the feedback point-based and between 220
and 360 words.

When no draft is provided, act as a subject-matter expert in conversation:
give thoughtful advice, ask clarifying questions when needed, and stay
constructive and specific.";

const SEO_INSTRUCTION: &str = "\
You are an SEO optimization specialist improving content for search
visibility while preserving quality.

When content is provided, deliver:
1. SEO analysis: keyword opportunities, structure, readability
2. Optimization suggestions: titles, headings, meta description, keyword
   integration, linking opportunities
3. An enhanced version of the content balancing keyword optimization with
   natural readability

Stick to white-hat practices; never sacrifice the reader for a keyword.";

const ORCHESTRATOR_INSTRUCTION: &str = "\
You are the orchestrator of a content-creation assistant with specialist
agents for ideation, outlining, drafting, feedback, and SEO. No specialist
matched this request, so answer it directly and helpfully yourself. If the
user seems unsure what to do next, briefly explain the workflow: ideas,
outline, draft, feedback, SEO.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_validates() {
        let registry = AgentRegistry::builtin("gemini-2.5-flash");
        registry.validate().unwrap();
    }

    #[test]
    fn every_slot_has_exactly_one_producer() {
        let registry = AgentRegistry::builtin("m");
        for slot in OutputSlot::ALL {
            let producer = registry.producer_of(slot).unwrap();
            assert_eq!(producer.output_slot, Some(slot));
        }
        assert_eq!(registry.specialists().count(), OutputSlot::ALL.len());
    }

    #[test]
    fn duplicate_producer_is_a_configuration_error() {
        let mut agents: Vec<AgentSpec> = AgentRegistry::builtin("m").agents;
        agents.push(AgentSpec {
            name: "ideate2".into(),
            model: "m".into(),
            description: String::new(),
            instruction: String::new(),
            output_slot: Some(OutputSlot::Ideas),
            reads: Vec::new(),
        });
        let err = AgentRegistry::new(agents).validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn missing_producer_is_a_configuration_error() {
        let agents: Vec<AgentSpec> = AgentRegistry::builtin("m")
            .agents
            .into_iter()
            .filter(|a| a.name != "seo")
            .collect();
        let err = AgentRegistry::new(agents).validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(m) if m.contains("seo-result")));
    }

    #[test]
    fn missing_orchestrator_is_a_configuration_error() {
        let agents: Vec<AgentSpec> = AgentRegistry::builtin("m")
            .agents
            .into_iter()
            .filter(|a| a.name != ORCHESTRATOR)
            .collect();
        assert!(AgentRegistry::new(agents).validate().is_err());
    }
}
