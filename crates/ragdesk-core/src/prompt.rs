//! Prompt construction
//!
//! The system prompt comes from the per-domain configuration table; the user
//! prompt embeds the assembled context verbatim. An empty context degrades
//! to no-context mode where the raw question is sent on its own.

use crate::config::DomainConfig;
use crate::error::{RagdeskError, Result};
use crate::types::Language;
use std::collections::HashMap;

/// A system/user prompt pair ready for the chat client
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Builds prompts for a configured set of domains
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompts: HashMap<String, String>,
    domain: String,
}

impl PromptBuilder {
    /// Create a builder serving `domain` out of the configured domain table
    pub fn new(domains: &HashMap<String, DomainConfig>, domain: &str) -> Result<Self> {
        let system_prompts: HashMap<String, String> = domains
            .iter()
            .map(|(name, config)| (name.clone(), config.system_prompt.clone()))
            .collect();

        if !system_prompts.contains_key(domain) {
            return Err(RagdeskError::Config(format!(
                "no system prompt configured for domain: {}",
                domain
            )));
        }

        Ok(Self {
            system_prompts,
            domain: domain.to_string(),
        })
    }

    /// Active domain name
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Build the prompt pair for one question
    pub fn build(&self, context: &str, question: &str, language: Language) -> Prompt {
        // Presence checked at construction
        let system = self.system_prompts[&self.domain].clone();

        let user = if context.trim().is_empty() {
            question.to_string()
        } else {
            format!(
                "Answer in {} language. bn is for bengali. en is for english.\n\n\
                 Based on the following context:\n{}\n\n\
                 Question: {}\n\n\
                 Answer:",
                language.code(),
                context,
                question
            )
        };

        Prompt { system, user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn builder(domain: &str) -> PromptBuilder {
        PromptBuilder::new(&Config::default().domains, domain).unwrap()
    }

    #[test]
    fn test_unknown_domain_rejected() {
        let result = PromptBuilder::new(&Config::default().domains, "legal");
        assert!(matches!(result, Err(RagdeskError::Config(_))));
    }

    #[test]
    fn test_no_context_mode_sends_raw_question() {
        let prompt = builder("hr").build("", "What is the travel policy?", Language::En);
        assert_eq!(prompt.user, "What is the travel policy?");
    }

    #[test]
    fn test_whitespace_context_is_no_context() {
        let prompt = builder("hr").build("   \n ", "What is the travel policy?", Language::En);
        assert_eq!(prompt.user, "What is the travel policy?");
    }

    #[test]
    fn test_context_mode_embeds_context_and_cue() {
        let prompt = builder("hr").build(
            "Travel must be approved in advance.",
            "What is the travel policy?",
            Language::En,
        );
        assert!(prompt.user.contains("Answer in en language"));
        assert!(prompt.user.contains("Travel must be approved in advance."));
        assert!(prompt.user.contains("Question: What is the travel policy?"));
        assert!(prompt.user.ends_with("Answer:"));
    }

    #[test]
    fn test_language_instruction_bn() {
        let prompt = builder("merchant").build("context", "প্রশ্ন", Language::Bn);
        assert!(prompt.user.contains("Answer in bn language"));
    }

    #[test]
    fn test_domain_selects_system_prompt() {
        let hr = builder("hr").build("c", "q", Language::En);
        let merchant = builder("merchant").build("c", "q", Language::En);
        assert_ne!(hr.system, merchant.system);
    }
}
