//! Built-in stages and definitions
//!
//! Three workflow kinds ship with the engine:
//!
//! - `lead_qualification`: `check_lead_fields -> score_lead`
//! - `email_processing`: `check_email_fields -> analyze_email`
//! - `document_automation`: `classify_document -> extract_document -> validate_document -> route_document`
//!
//! Prompt stages need an LLM API key at run time; rule-based stages do not.

use flowmancer_core::domain::context::{Context, StageOutput};
use flowmancer_core::domain::workflow::WorkflowDefinition;
use serde_json::{Value, json};

use super::{FnStage, LlmClient, PromptStage, RequiredFieldsStage};
use crate::config::Settings;
use crate::registry::StageCatalog;

pub const LEAD_QUALIFICATION: &str = "lead_qualification";
pub const EMAIL_PROCESSING: &str = "email_processing";
pub const DOCUMENT_AUTOMATION: &str = "document_automation";

/// Amount above which documents need approval unless `_config.approval_threshold` says otherwise
const DEFAULT_APPROVAL_THRESHOLD: f64 = 1000.0;

const DOCUMENT_KINDS: [&str; 3] = ["invoice", "contract", "receipt"];

const LEAD_PROMPT: &str = "You are a lead qualification expert. Analyze this lead and provide a structured assessment.

Lead Information:
Name: {name}
Email: {email}
Company: {company}
Phone: {phone}
Message: {message}

Reply with a JSON object containing:
- score (0-100)
- qualification (High/Medium/Low)
- reasoning (brief)
- next_action (recommended next action for the sales team)
- priority (urgent/high/medium/low)";

const EMAIL_PROMPT: &str = "You are an email processing expert. Analyze this email and provide a structured response.

Email:
From: {from_email}
Subject: {subject}
Body: {body}

Reply with a JSON object containing:
- category (support/sales/partnership/spam)
- priority (urgent/high/medium/low)
- sentiment (positive/neutral/negative)
- draft_response (professional email reply)
- action_required (bool)
- assigned_to (which team)
- tags (array of relevant tags)";

const EXTRACT_PROMPT: &str = "You are a document processing expert. Extract the key fields of this {document_type}.

Content:
{file_content}

Reply with a single JSON object of key-value pairs, for example:
{\"invoice_number\": \"INV-001\", \"date\": \"2024-01-15\", \"vendor\": \"Acme Corp\", \"total_amount\": 1500.00}";

/// Stage catalog with every built-in stage registered
pub fn catalog(settings: &Settings) -> StageCatalog {
    let llm = LlmClient::from_settings(settings);
    let mut catalog = StageCatalog::new();

    catalog.register(RequiredFieldsStage::new(
        "check_lead_fields",
        "lead",
        &["name", "email"],
    ));
    catalog.register(PromptStage::new("score_lead", LEAD_PROMPT, "assessment", llm.clone()));

    catalog.register(RequiredFieldsStage::new(
        "check_email_fields",
        "email",
        &["subject", "body"],
    ));
    catalog.register(PromptStage::new("analyze_email", EMAIL_PROMPT, "analysis", llm.clone()));

    catalog.register(FnStage::new("classify_document", classify_document));
    catalog.register(PromptStage::new(
        "extract_document",
        EXTRACT_PROMPT,
        "extracted_data",
        llm,
    ));
    catalog.register(FnStage::new("validate_document", validate_document));
    catalog.register(FnStage::new("route_document", route_document));

    catalog
}

/// Definitions for the built-in workflow kinds, all active and without integrations
pub fn default_definitions() -> Vec<WorkflowDefinition> {
    vec![
        WorkflowDefinition::new(
            "Lead Qualification",
            LEAD_QUALIFICATION,
            vec!["check_lead_fields".into(), "score_lead".into()],
        )
        .with_description("Validate and score inbound leads"),
        WorkflowDefinition::new(
            "Email Processing",
            EMAIL_PROCESSING,
            vec!["check_email_fields".into(), "analyze_email".into()],
        )
        .with_description("Classify emails and draft a response"),
        WorkflowDefinition::new(
            "Document Automation",
            DOCUMENT_AUTOMATION,
            vec![
                "classify_document".into(),
                "extract_document".into(),
                "validate_document".into(),
                "route_document".into(),
            ],
        )
        .with_description("Classify, extract, validate and route business documents"),
    ]
}

// ============================================================================
// Document stages
// ============================================================================

fn classify_document(ctx: &Context) -> Result<StageOutput, String> {
    let declared = ctx
        .get("document_type")
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .filter(|t| DOCUMENT_KINDS.contains(&t.as_str()));

    let content = ctx
        .get("file_content")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty());

    let (document_type, method) = match (declared, content) {
        (Some(declared), _) => (declared, "declared"),
        (None, Some(content)) => {
            let lower = content.to_lowercase();
            let detected = DOCUMENT_KINDS
                .iter()
                .find(|kind| lower.contains(*kind))
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "other".to_string());
            (detected, "keyword")
        }
        (None, None) => return Err("document has no file_content".to_string()),
    };

    let mut out = StageOutput::new();
    out.insert("document_type".into(), json!(document_type));
    out.insert("classification_method".into(), json!(method));
    Ok(out)
}

fn validate_document(ctx: &Context) -> Result<StageOutput, String> {
    let extracted = ctx
        .get("extracted_data")
        .and_then(Value::as_object)
        .ok_or("extracted_data is missing or not an object")?;

    let required: &[&str] = match ctx.get("document_type").and_then(Value::as_str) {
        Some("invoice") => &["invoice_number", "total_amount"],
        Some("receipt") => &["total_amount"],
        Some("contract") => &["parties"],
        _ => &[],
    };

    let errors: Vec<String> = required
        .iter()
        .filter(|field| extracted.get(**field).is_none_or(Value::is_null))
        .map(|field| format!("Missing extracted field: {}", field))
        .collect();

    let status = if errors.is_empty() { "valid" } else { "needs_review" };

    let mut out = StageOutput::new();
    out.insert("validation_status".into(), json!(status));
    out.insert("validation_errors".into(), json!(errors));
    Ok(out)
}

fn route_document(ctx: &Context) -> Result<StageOutput, String> {
    let status = ctx
        .get("validation_status")
        .and_then(Value::as_str)
        .ok_or("validation_status is missing")?;

    let threshold = ctx
        .lookup("_config.approval_threshold")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_APPROVAL_THRESHOLD);

    let amount = ctx.lookup("extracted_data.total_amount").and_then(amount_of);
    let is_contract = ctx.get("document_type").and_then(Value::as_str) == Some("contract");

    let approval_required =
        status != "valid" || is_contract || amount.is_some_and(|a| a > threshold);

    let mut next_steps = Vec::new();
    if status != "valid" {
        next_steps.push("manual_review");
    }
    if approval_required {
        next_steps.push("send_for_approval");
    }
    if status == "valid" {
        next_steps.push("update_accounting_system");
    }

    let mut out = StageOutput::new();
    out.insert("approval_required".into(), json!(approval_required));
    out.insert("next_steps".into(), json!(next_steps));
    Ok(out)
}

/// Amounts arrive as numbers or as strings such as "1,500.00"
fn amount_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect::<String>()
            .parse()
            .ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(value: Value) -> Context {
        Context::seed(&value, &Value::Null)
    }

    #[test]
    fn test_catalog_covers_default_definitions() {
        let catalog = catalog(&Settings::default());
        for def in default_definitions() {
            assert!(
                catalog.unknown_stages(&def.stages).is_empty(),
                "{} references unregistered stages",
                def.workflow_type
            );
        }
    }

    #[test]
    fn test_classify_prefers_declared_type() {
        let out = classify_document(&ctx(json!({
            "document_type": "Receipt",
            "file_content": "INVOICE #1"
        })))
        .unwrap();
        assert_eq!(out.get("document_type"), Some(&json!("receipt")));
        assert_eq!(out.get("classification_method"), Some(&json!("declared")));
    }

    #[test]
    fn test_classify_by_keyword_and_unknown() {
        let out = classify_document(&ctx(json!({"file_content": "Invoice INV-7"}))).unwrap();
        assert_eq!(out.get("document_type"), Some(&json!("invoice")));

        let out = classify_document(&ctx(json!({"file_content": "hello"}))).unwrap();
        assert_eq!(out.get("document_type"), Some(&json!("other")));

        assert!(classify_document(&ctx(json!({}))).is_err());
    }

    #[test]
    fn test_validate_invoice_fields() {
        let out = validate_document(&ctx(json!({
            "document_type": "invoice",
            "extracted_data": {"invoice_number": "INV-1", "total_amount": null}
        })))
        .unwrap();
        assert_eq!(out.get("validation_status"), Some(&json!("needs_review")));
        assert_eq!(
            out.get("validation_errors"),
            Some(&json!(["Missing extracted field: total_amount"]))
        );

        assert!(validate_document(&ctx(json!({"extracted_data": "text"}))).is_err());
    }

    #[test]
    fn test_route_uses_configured_threshold() {
        let input = json!({
            "document_type": "invoice",
            "validation_status": "valid",
            "extracted_data": {"total_amount": "1,500.00"}
        });

        let out = route_document(&ctx(input.clone())).unwrap();
        assert_eq!(out.get("approval_required"), Some(&json!(true)));

        let relaxed = Context::seed(&input, &json!({"approval_threshold": 5000}));
        let out = route_document(&relaxed).unwrap();
        assert_eq!(out.get("approval_required"), Some(&json!(false)));
        assert_eq!(out.get("next_steps"), Some(&json!(["update_accounting_system"])));
    }

    #[test]
    fn test_route_ignores_threshold_smuggled_in_input() {
        let input = json!({
            "document_type": "invoice",
            "validation_status": "valid",
            "extracted_data": {"total_amount": 5_000_000},
            "_config": {"approval_threshold": 1e12}
        });
        let definition = default_definitions()
            .into_iter()
            .find(|d| d.workflow_type == DOCUMENT_AUTOMATION)
            .unwrap();

        let out = route_document(&Context::seed(&input, &definition.config)).unwrap();
        assert_eq!(out.get("approval_required"), Some(&json!(true)));
    }
}
