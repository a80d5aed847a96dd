//! ID resolver module
//!
//! Resolves workflow ID prefixes to full UUIDs by listing definitions, so
//! users can type a short, unambiguous prefix instead of a full UUID.

use anyhow::{Context, Result, bail};
use flowmancer_client::FlowmancerClient;
use flowmancer_core::dto::workflow::Page;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Largest page fetched when resolving a prefix
const RESOLVE_PAGE_LIMIT: usize = 1000;

/// Resolve a workflow ID, prefix or workflow type to a full UUID
pub async fn resolve_workflow_id(client: &FlowmancerClient, id: &str) -> Result<Uuid> {
    let id_or_prefix = IdOrPrefix::parse(id);
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let workflows = client
        .list_workflows(Page {
            skip: 0,
            limit: RESOLVE_PAGE_LIMIT,
        })
        .await
        .context("Failed to fetch workflows for ID resolution")?;

    if let Some(by_type) = workflows.iter().find(|w| w.workflow_type == id) {
        return Ok(by_type.id);
    }

    let candidates: Vec<Uuid> = workflows.iter().map(|w| w.id).collect();
    pick_unique(&id_or_prefix, &candidates, "workflow")
}

/// Exactly one candidate must match the prefix
pub fn pick_unique(id_or_prefix: &IdOrPrefix, candidates: &[Uuid], kind: &str) -> Result<Uuid> {
    let matches: Vec<Uuid> = candidates
        .iter()
        .copied()
        .filter(|id| id_or_prefix.matches(*id))
        .collect();

    match matches.as_slice() {
        [] => bail!("No {} found with ID starting with '{}'", kind, id_or_prefix),
        [only] => Ok(*only),
        many => {
            let ids: Vec<String> = many.iter().map(Uuid::to_string).collect();
            bail!(
                "Ambiguous prefix '{}' matches multiple {}s: {}",
                id_or_prefix,
                kind,
                ids.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<Uuid> {
        [
            "aa000000-0000-4000-8000-000000000001",
            "ab000000-0000-4000-8000-000000000002",
            "ab100000-0000-4000-8000-000000000003",
        ]
        .iter()
        .map(|s| Uuid::parse_str(s).unwrap())
        .collect()
    }

    #[test]
    fn test_pick_unique_prefix() {
        let ids = ids();
        assert_eq!(pick_unique(&IdOrPrefix::parse("aa"), &ids, "workflow").unwrap(), ids[0]);
        assert_eq!(pick_unique(&IdOrPrefix::parse("ab1"), &ids, "workflow").unwrap(), ids[2]);
    }

    #[test]
    fn test_pick_unique_errors() {
        let ids = ids();
        let err = pick_unique(&IdOrPrefix::parse("ab"), &ids, "workflow").unwrap_err();
        assert!(err.to_string().starts_with("Ambiguous prefix 'ab'"));

        let err = pick_unique(&IdOrPrefix::parse("ff"), &ids, "workflow").unwrap_err();
        assert_eq!(err.to_string(), "No workflow found with ID starting with 'ff'");
    }
}
