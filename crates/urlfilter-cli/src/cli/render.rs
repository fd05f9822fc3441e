use super::commands::{ApplyOutcome, DecodeOutcome, EncodeOutcome};
use super::styles;
use urlfilter::codec::value::ParamValue;
use urlfilter::model::{Configuration, ConfigurationKind, PropertyCondition};
use urlfilter::reconcile::ReconcileReport;

pub fn render_encode(outcome: &EncodeOutcome) -> String {
    if outcome.query.is_empty() {
        return format!("{}\n", styles::muted().apply_to("(no filter parameters)"));
    }
    format!("{}\n", outcome.query)
}

pub fn render_apply(outcome: &ApplyOutcome) -> String {
    let mut out = render_configuration(&outcome.configuration);
    out.push_str(&render_report(&outcome.update.report));

    if !outcome.update.undecodable.is_empty() {
        out.push_str(&format!(
            "{} {}\n",
            styles::heading().apply_to("Undecodable:"),
            styles::rejected().apply_to(outcome.update.undecodable.join(", "))
        ));
    }

    match &outcome.location {
        Some(location) if location.is_empty() => out.push_str(&format!(
            "{} {}\n",
            styles::heading().apply_to("Location:"),
            styles::muted().apply_to("(no query parameters)")
        )),
        Some(location) => out.push_str(&format!(
            "{} {}\n",
            styles::heading().apply_to("Location:"),
            location
        )),
        None => out.push_str(&format!(
            "{} {}\n",
            styles::heading().apply_to("Location:"),
            styles::muted().apply_to("unchanged")
        )),
    }
    out
}

pub fn render_decode(outcome: &DecodeOutcome) -> String {
    let mut out = String::new();
    for condition in &outcome.conditions {
        out.push_str(&format!("  {}\n", render_condition(condition)));
    }
    for dropped in &outcome.dropped {
        out.push_str(&format!(
            "  {} {} {}\n",
            styles::rejected().apply_to("dropped"),
            dropped.token,
            styles::muted().apply_to(format!("({})", dropped.reason))
        ));
    }
    out
}

pub fn render_configuration(configuration: &Configuration) -> String {
    let id = configuration.id.as_deref().unwrap_or("<empty>");
    let kind = match configuration.kind {
        ConfigurationKind::RunTime => "run-time",
        ConfigurationKind::DesignTime => "design-time",
    };
    let mut out = format!(
        "{} {} {}\n",
        styles::heading().apply_to("Configuration:"),
        styles::configuration().apply_to(id),
        styles::muted().apply_to(format!("({})", kind))
    );

    if configuration.is_empty() {
        out.push_str(&format!("  {}\n", styles::muted().apply_to("no conditions")));
    }
    for entry in &configuration.entries {
        let line = match entry.condition.as_property() {
            Some(condition) => render_condition(condition),
            None => styles::muted().apply_to("(group)").to_string(),
        };
        if entry.modified {
            out.push_str(&format!("  {} {}\n", line, styles::added().apply_to("*")));
        } else {
            out.push_str(&format!("  {}\n", line));
        }
    }
    out
}

pub fn render_condition(condition: &PropertyCondition) -> String {
    let value = condition
        .value
        .as_ref()
        .map(describe_value)
        .unwrap_or_else(|| "-".to_string());
    let lock = if condition.operation_editable { "" } else { " [locked]" };
    format!(
        "{} {} {}{}",
        styles::property().apply_to(&condition.property),
        styles::operation().apply_to(condition.operation),
        styles::value().apply_to(value),
        styles::muted().apply_to(lock)
    )
}

fn render_report(report: &ReconcileReport) -> String {
    let sections = [
        ("Updated:", &report.updated),
        ("Inserted:", &report.inserted),
        ("Dropped:", &report.dropped),
        ("Rejected:", &report.rejected),
    ];
    sections
        .iter()
        .filter(|(_, paths)| !paths.is_empty())
        .map(|(label, paths)| {
            format!("{} {}\n", styles::heading().apply_to(label), paths.join(", "))
        })
        .collect()
}

pub fn describe_value(value: &ParamValue) -> String {
    match value {
        ParamValue::Text(s) => format!("\"{}\"", s),
        ParamValue::Integer(n) => n.to_string(),
        ParamValue::Decimal(n) => n.to_string(),
        ParamValue::Boolean(b) => b.to_string(),
        ParamValue::Uuid(id) => id.to_string(),
        ParamValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        ParamValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        ParamValue::Enum(id) => id.clone(),
        ParamValue::List(items) => format!(
            "[{}]",
            items.iter().map(describe_value).collect::<Vec<_>>().join(", ")
        ),
        ParamValue::Interval(interval) => interval.to_string(),
    }
}
