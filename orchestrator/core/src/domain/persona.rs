// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Canned system prompts ("personas") the cloud adapters send ahead of the
//! user's question.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persona {
    TravelAssistant,
    TechnicalSupport,
    AcademicResearch,
    GeneralAssistant,
}

const TRAVEL_ASSISTANT: &str = "You are an expert travel assistant specializing in visa \
requirements and travel documentation. When asked about a trip, cover the required visa type \
and application process, passport validity rules, additional documents, current travel \
advisories and recommended vaccinations. Answer in markdown with headings (##), subheadings \
(###) and bullet points (-). Be accurate, complete and clear.";

const TECHNICAL_SUPPORT: &str = "You are a technical support specialist. Identify the core \
issue, give step-by-step troubleshooting with the relevant technical details, and finish with \
preventive measures. Keep explanations clear and concise.";

const ACADEMIC_RESEARCH: &str = "You are an academic research assistant. Cite relevant studies \
and sources, explain methodologies where applicable, provide critical analysis and suggest \
further reading. Use formal academic language while staying clear.";

const GENERAL_ASSISTANT: &str = "You are a general knowledge assistant. Give accurate, concise \
information, structure complex answers logically, highlight the important details and state \
your assumptions when the question is ambiguous.";

impl Persona {
    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::TravelAssistant => TRAVEL_ASSISTANT,
            Self::TechnicalSupport => TECHNICAL_SUPPORT,
            Self::AcademicResearch => ACADEMIC_RESEARCH,
            Self::GeneralAssistant => GENERAL_ASSISTANT,
        }
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "travel-assistant" | "travel" => Ok(Self::TravelAssistant),
            "technical-support" | "support" => Ok(Self::TechnicalSupport),
            "academic-research" | "research" => Ok(Self::AcademicResearch),
            "general-assistant" | "general" => Ok(Self::GeneralAssistant),
            other => Err(format!("unknown persona '{}'", other)),
        }
    }
}
