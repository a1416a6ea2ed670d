//! Template loading and management

use azure_provider_report_common::{ReportError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    // Register custom filters
    tera.register_filter("percent", percent_filter);
    tera.register_filter("thousands", thousands_filter);
    tera.register_filter("dom_id", dom_id_filter);

    // Macros must be registered together with the templates importing them
    tera.add_raw_templates(vec![
        ("macros.html", include_str!("../templates/macros.html.tera")),
        ("report.html", include_str!("../templates/report.html.tera")),
    ])
    .map_err(|e| ReportError::Render(format!("Failed to load report templates: {:?}", e)))?;

    Ok(tera)
}

/// Filter to format a percentage with a fixed number of decimals
///
/// Usage: `{{ value | percent(decimals=1) }}`; defaults to two decimals.
fn percent_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let number = value
        .as_f64()
        .ok_or_else(|| tera::Error::msg("percent filter expects a number"))?;

    let decimals = match args.get("decimals") {
        Some(d) => d
            .as_u64()
            .ok_or_else(|| tera::Error::msg("percent filter: decimals must be an integer"))?
            as usize,
        None => 2,
    };

    Ok(Value::String(format!("{:.*}%", decimals, number)))
}

/// Filter to group an integer's digits by thousands
fn thousands_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let number = value
        .as_u64()
        .ok_or_else(|| tera::Error::msg("thousands filter expects a non-negative integer"))?;

    Ok(Value::String(group_thousands(number)))
}

/// Filter to turn an arbitrary string into a safe element id fragment
fn dom_id_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("dom_id filter expects a string"))?;

    let id: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();

    Ok(Value::String(id))
}

fn group_thousands(number: u64) -> String {
    let digits = number.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}
