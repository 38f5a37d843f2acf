//! Prompt construction for the reasoning call.
//!
//! The system prompt restates the deterministic rules so the model never
//! contradicts them, then asks for strict JSON back.

use serde::Serialize;

use crate::domain::ports::{ReasoningRequest, ReasoningSourceError};
use crate::domain::{ReferenceData, TargetMapping};

/// Guidance given to the model, one line per rule.
const RULES: &[&str] = &[
    "Keep every mapping whose field is not listed in `unresolved_fields` exactly as given.",
    "For each unresolved field, choose the value best supported by `reference_data`; \
     if nothing supports a change, keep the original value.",
    "Set `target_confidence` to \"enhanced\" only when you changed the value, otherwise \"original\".",
    "Width UOM written as inches is rendered as a double quote character.",
    "UOM values of yd or yds are rendered as Yards.",
    "A Material Master Grid that cannot be specified is rendered as No Grid.",
    "A blank Source Type is rendered as Nominated.",
    "Never invent codes that do not appear in `reference_data`.",
];

const RESPONSE_SHAPE: &str = "Answer with a single JSON object of the form \
{\"target_mappings\": [{\"target_field\": string, \"target_value\": string, \
\"target_confidence\": \"original\" | \"enhanced\"}]} listing every input mapping in input order.";

pub(super) fn system_prompt() -> String {
    let mut prompt = String::from(
        "You enhance fields extracted from textile material documents using company reference data.\n\nRules:\n",
    );
    for (index, rule) in RULES.iter().enumerate() {
        prompt.push_str(&format!("{}. {rule}\n", index + 1));
    }
    prompt.push('\n');
    prompt.push_str(RESPONSE_SHAPE);
    prompt
}

#[derive(Serialize)]
struct UserPayload<'a> {
    unresolved_fields: &'a [String],
    target_mappings: &'a [TargetMapping],
    reference_data: &'a ReferenceData,
}

pub(super) fn user_prompt(request: &ReasoningRequest) -> Result<String, ReasoningSourceError> {
    if request.unresolved_fields.is_empty() {
        return Err(ReasoningSourceError::invalid_request(
            "no unresolved fields to reason about",
        ));
    }
    let payload = UserPayload {
        unresolved_fields: &request.unresolved_fields,
        target_mappings: &request.mappings,
        reference_data: &request.reference_data,
    };
    serde_json::to_string_pretty(&payload)
        .map_err(|err| ReasoningSourceError::invalid_request(err.to_string()))
}
