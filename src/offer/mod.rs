use anyhow::Context;
use log::info;
use reqwest::Client;
use serde_json::{Map, Value};

/// Flattened job offer, keyed by the output names of the mapping table.
pub(crate) type JobOfferRecord = Map<String, Value>;

/// One projection rule: which nested source field lands under which output
/// key. `rename: None` keeps the final path segment as the key.
struct FieldMapping {
    path: &'static str,
    rename: Option<&'static str>,
}

/// Projection table for the upstream `job` payload. Fixed at build time;
/// downstream consumers key on exactly these French field names.
const FIELD_MAPPINGS: [FieldMapping; 19] = [
    FieldMapping { path: "reference", rename: Some("id") },
    FieldMapping { path: "published_at", rename: Some("date_publication") },
    FieldMapping { path: "contract_type", rename: Some("contrat") },
    FieldMapping { path: "name", rename: Some("intitule") },
    FieldMapping { path: "description", rename: None },
    FieldMapping { path: "organization.industry", rename: Some("secteur_activite") },
    FieldMapping { path: "education_level", rename: Some("niveau_etudes") },
    FieldMapping { path: "salary_period", rename: None },
    FieldMapping { path: "organization.name", rename: Some("entreprise") },
    FieldMapping { path: "organization.description", rename: Some("description_entreprise") },
    FieldMapping { path: "office.city", rename: Some("ville") },
    FieldMapping { path: "link", rename: None },
    FieldMapping { path: "organization.logo.url", rename: Some("logo") },
    FieldMapping { path: "salary_min", rename: None },
    FieldMapping { path: "salary_max", rename: None },
    FieldMapping { path: "experience_level", rename: Some("experience") },
    FieldMapping { path: "updated_at", rename: Some("date_modif") },
    FieldMapping { path: "office.latitude", rename: Some("latitude") },
    FieldMapping { path: "office.longitude", rename: Some("longitude") },
];

impl FieldMapping {
    fn output_key(&self) -> &'static str {
        self.rename
            .unwrap_or_else(|| self.path.rsplit('.').next().unwrap_or(self.path))
    }
}

/// Walks `root` one dot-separated segment at a time. Returns `None` as soon
/// as a segment is missing or the current value is not an object. An
/// explicit JSON null leaf comes back as `Some(Null)`, which keeps it
/// distinguishable from an absent key.
fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |value, segment| value.get(segment))
}

/// Projects the mapping table against one `job` object. Entries whose path
/// does not fully resolve are left out of the record entirely; null leaves
/// are kept as null. Insertion order follows the table, so the printed
/// record does too.
pub(crate) fn project_job(job: &Value) -> JobOfferRecord {
    let mut record = JobOfferRecord::new();
    for mapping in &FIELD_MAPPINGS {
        if let Some(value) = resolve_path(job, mapping.path) {
            record.insert(mapping.output_key().to_string(), value.clone());
        }
    }
    record
}

/// Outcome of one extraction: the record that could be built, plus the
/// failure that cut it short, if any. Callers print the record either way
/// and only log the failure.
pub(crate) struct ExtractedOffer {
    pub(crate) record: JobOfferRecord,
    pub(crate) failure: Option<anyhow::Error>,
}

/// Fetches one offer payload and projects it into a flat record. Never
/// fails: fetch or shape errors are folded into [`ExtractedOffer::failure`]
/// together with whatever record was available, an empty one when the
/// payload never arrived.
pub(crate) async fn fetch_offer(client: &Client, url: &str) -> ExtractedOffer {
    info!("fetching {url}");
    match try_fetch(client, url).await {
        Ok(record) => {
            info!("{} of {} mapped fields resolved", record.len(), FIELD_MAPPINGS.len());
            ExtractedOffer { record, failure: None }
        }
        Err(failure) => ExtractedOffer {
            record: JobOfferRecord::new(),
            failure: Some(failure),
        },
    }
}

async fn try_fetch(client: &Client, url: &str) -> anyhow::Result<JobOfferRecord> {
    let body: Value = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()?
        .json()
        .await
        .context("response body is not JSON")?;
    let job = body
        .get("job")
        .with_context(|| format!("no `job` object in the response from {url}"))?;
    Ok(project_job(job))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn resolved_paths_land_under_their_output_keys() {
        let job = json!({
            "reference": "42",
            "organization": { "industry": "tech" }
        });
        assert_eq!(
            Value::Object(project_job(&job)),
            json!({ "id": "42", "secteur_activite": "tech" })
        );
    }

    #[test]
    fn null_leaf_is_kept_while_missing_key_is_not() {
        let job = json!({ "salary_min": null });
        let record = project_job(&job);
        assert_eq!(record.get("salary_min"), Some(&Value::Null));
        assert_eq!(record.get("salary_max"), None);
    }

    #[test]
    fn traversal_stops_at_non_object_intermediates() {
        let job = json!({
            "organization": "not an object",
            "office": { "city": "Paris" }
        });
        let record = project_job(&job);
        assert!(record.get("secteur_activite").is_none());
        assert!(record.get("entreprise").is_none());
        assert_eq!(record.get("ville"), Some(&json!("Paris")));
    }

    #[test]
    fn unrenamed_entries_use_the_final_path_segment() {
        let job = json!({
            "salary_period": "yearly",
            "organization": { "logo": { "url": "https://img.test/a.png" } }
        });
        let record = project_job(&job);
        assert_eq!(record.get("salary_period"), Some(&json!("yearly")));
        assert_eq!(record.get("logo"), Some(&json!("https://img.test/a.png")));
    }

    #[test]
    fn record_keys_follow_mapping_order() {
        let job = json!({
            "updated_at": "2023-05-06T10:00:00Z",
            "reference": "abc",
            "office": { "latitude": 48.85, "city": "Paris" }
        });
        let record = project_job(&job);
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "ville", "date_modif", "latitude"]);
    }

    #[test]
    fn full_payload_resolves_every_mapping() {
        let job = json!({
            "reference": "REF1",
            "published_at": "2023-05-04T09:12:33Z",
            "contract_type": "FULL_TIME",
            "name": "Data Engineer",
            "description": "<p>build pipelines</p>",
            "organization": {
                "industry": "Software",
                "name": "Acme",
                "description": "<p>we make anvils</p>",
                "logo": { "url": "https://img.test/logo.png" }
            },
            "education_level": "BAC_5",
            "salary_period": "yearly",
            "salary_min": 40,
            "salary_max": 50,
            "experience_level": "1_TO_2_YEARS",
            "updated_at": "2023-05-06T10:00:00Z",
            "office": { "city": "Paris", "latitude": 48.85, "longitude": 2.35 },
            "link": "https://jobs.test/offer"
        });
        let record = project_job(&job);
        assert_eq!(record.len(), 19);
        assert_eq!(record.get("entreprise"), Some(&json!("Acme")));
        assert_eq!(record.get("niveau_etudes"), Some(&json!("BAC_5")));
        assert_eq!(record.get("longitude"), Some(&json!(2.35)));
    }
}
