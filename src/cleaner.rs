use chrono::NaiveDateTime;
use scraper::Html;
use serde_json::Value;

use crate::offer::JobOfferRecord;

const UNSPECIFIED: &str = "Non spécifié";
const UNSPECIFIED_COLUMN: &str = "Non spécifié.";
const NO_SALARY: &str = "Salaire non indiqué.";
const SOURCE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const CLEAN_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Final column set, in output order. Anything else is dropped and every
/// absent column is backfilled with [`UNSPECIFIED_COLUMN`].
const COLUMNS: [&str; 16] = [
    "id",
    "date_publication",
    "date_modif",
    "secteur_activite",
    "intitule",
    "entreprise",
    "logo",
    "description",
    "contrat",
    "description_entreprise",
    "ville",
    "latitude",
    "longitude",
    "experience",
    "niveau_etudes",
    "salary",
];

/// Normalizes one flattened offer into the fixed 16-column shape: bucketed
/// experience and education labels, tag-free descriptions, short dates and
/// a single yearly salary figure.
pub(crate) fn clean_record(mut record: JobOfferRecord) -> JobOfferRecord {
    normalize_experience(&mut record);
    normalize_education(&mut record);
    strip_descriptions(&mut record);
    reformat_dates(&mut record);
    compute_salary(&mut record);
    select_columns(record)
}

/// Upstream experience labels come in two vocabularies, enum codes such as
/// `1_TO_2_YEARS` and free-form French sentences. Both fold into the same
/// buckets; anything unrecognized is left as it came.
fn experience_bucket(raw: &str) -> Option<&'static str> {
    match raw {
        "Débutant accepté (0 YEAR)" | "LESS_THAN_6_MONTHS" | "6_MONTHS_TO_1_YEAR" => {
            Some("6 mois")
        }
        "Expérience exigée de 1 An(s)" | "1_TO_2_YEARS" => Some("1 an"),
        "Expérience exigée de 2 An(s)" | "24 mois" | "2_TO_3_YEARS" => Some("2 ans"),
        "Expérience exigée de 3 An(s)"
        | "Expérience souhaitée de 3 An(s)"
        | "3_TO_4_YEARS"
        | "36 mois" => Some("3 ans"),
        "4_TO_5_YEARS" | "Expérience exigée de 4 An(s)" => Some("4 ans"),
        "5 ans - DATA ANALYST"
        | "5 ans - 5 ans minimum"
        | "Expérience exigée de 5 An(s)"
        | "5_TO_7_YEARS" => Some("5 ans"),
        "Expérience exigée de 6 An(s)" | "7_TO_10_YEARS" => Some("5+ ans"),
        "10_TO_15_YEARS" => Some("10+ ans"),
        "Expérience exigée" | "Expérience souhaitée" => Some(UNSPECIFIED),
        _ => None,
    }
}

fn normalize_experience(record: &mut JobOfferRecord) {
    let normalized = match record.get("experience") {
        None => Some(UNSPECIFIED),
        // A null level means the offer is open to juniors.
        Some(Value::Null) => Some("6 mois"),
        Some(Value::String(raw)) => experience_bucket(raw),
        Some(_) => None,
    };
    if let Some(bucket) = normalized {
        record.insert("experience".to_string(), Value::String(bucket.to_string()));
    }
}

fn normalize_education(record: &mut JobOfferRecord) {
    let normalized = match record.get("niveau_etudes") {
        None => Some(UNSPECIFIED),
        Some(Value::String(raw)) => match raw.trim().to_lowercase().as_str() {
            "bac_5" | "bac+5" => Some("Bac +5"),
            "bac_4" | "bac+4" => Some("Bac +4"),
            "bac_3" | "bac+3" => Some("Bac +3"),
            "bac_2" | "bac+2" => Some("Bac +2"),
            _ => None,
        },
        Some(_) => None,
    };
    if let Some(level) = normalized {
        record.insert("niveau_etudes".to_string(), Value::String(level.to_string()));
    }
}

fn strip_descriptions(record: &mut JobOfferRecord) {
    for key in ["description", "description_entreprise"] {
        let stripped = match record.get(key) {
            Some(Value::String(html)) => Some(strip_html(html)),
            None | Some(Value::Null) => Some(String::new()),
            Some(_) => None,
        };
        if let Some(text) = stripped {
            record.insert(key.to_string(), Value::String(text));
        }
    }
}

/// Text content of an HTML fragment, with entities decoded, non-breaking
/// spaces flattened and newlines removed.
fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: Vec<_> = fragment.root_element().text().collect();
    text.join(" ").replace('\u{a0}', " ").replace('\n', "")
}

fn reformat_dates(record: &mut JobOfferRecord) {
    for key in ["date_publication", "date_modif"] {
        let reformatted = record
            .get(key)
            .and_then(Value::as_str)
            .and_then(|raw| NaiveDateTime::parse_from_str(raw, SOURCE_DATE_FORMAT).ok())
            .map(|date| date.format(CLEAN_DATE_FORMAT).to_string());
        if let Some(date) = reformatted {
            record.insert(key.to_string(), Value::String(date));
        }
    }
}

fn compute_salary(record: &mut JobOfferRecord) {
    let bounds = record
        .get("salary_min")
        .and_then(Value::as_f64)
        .zip(record.get("salary_max").and_then(Value::as_f64));
    let salary = match record.get("salary_period") {
        Some(period) => match period.as_str() {
            Some("yearly") => bounds.map(|(min, max)| midpoint(min, max)),
            Some("monthly") => bounds.map(|(min, max)| midpoint(min * 12.0, max * 12.0)),
            _ => None,
        },
        // Offers that give bounds without a period state monthly pay.
        None => bounds.map(|(min, max)| midpoint(min * 12.0, max * 12.0)),
    };
    if let Some(salary) = salary {
        for key in ["salary_period", "salary_min", "salary_max"] {
            record.remove(key);
        }
        record.insert("salary".to_string(), json_number(salary));
    } else if !record.contains_key("salary") {
        record.insert("salary".to_string(), Value::String(NO_SALARY.to_string()));
    }
}

/// Figures under 100 are yearly thousands, 45 standing for 45 000.
fn midpoint(min: f64, max: f64) -> f64 {
    let salary = (max + min) / 2.0;
    if salary < 100.0 {
        salary * 1000.0
    } else {
        salary
    }
}

fn json_number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn select_columns(mut record: JobOfferRecord) -> JobOfferRecord {
    let mut selected = JobOfferRecord::new();
    for column in COLUMNS {
        let value = record
            .remove(column)
            .unwrap_or_else(|| Value::String(UNSPECIFIED_COLUMN.to_string()));
        selected.insert(column.to_string(), value);
    }
    selected
}
