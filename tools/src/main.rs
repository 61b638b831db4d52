//! churn-runner: headless churn risk scoring.
//!
//! Usage:
//!   churn-runner --input customers.csv --models-dir models --output report.json
//!   churn-runner --input customers.json --config engine.json --alerts-dir reports
//!   churn-runner --ipc-mode --models-dir models

use anyhow::{Context, Result};
use churn_core::{
    alerts::{self, CustomerAlert},
    artifacts,
    config::EngineConfig,
    customer::CustomerInput,
    report::BatchReport,
    ChurnRiskEngine, CustomerRecord,
};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Assess { customer: CustomerInput },
    Batch { customers: Vec<CustomerInput> },
    Health,
    Quit,
}

#[derive(serde::Serialize)]
struct HealthState {
    status: &'static str,
    models_loaded: Vec<churn_core::ModelKind>,
    encoders_loaded: bool,
    scaler_loaded: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");

    let mut config = match flag_value(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = flag_value(&args, "--models-dir") {
        config.models_dir = PathBuf::from(dir);
    }
    config.alert_limit = parse_arg(&args, "--alert-limit", config.alert_limit);

    let engine = ChurnRiskEngine::new(
        artifacts::load_registry(&config),
        artifacts::load_preprocessor(&config),
    );

    if ipc_mode {
        return serve_ipc(&engine, io::stdin().lock(), &mut io::stdout());
    }

    let input = flag_value(&args, "--input")
        .context("--input <customers.json|customers.csv> is required outside --ipc-mode")?;
    let output = flag_value(&args, "--output");
    let alerts_dir = flag_value(&args, "--alerts-dir").unwrap_or("reports");

    println!("churn-runner");
    println!("  input:       {input}");
    println!("  models_dir:  {}", config.models_dir.display());
    println!("  models:      {:?}", engine.registry().available_kinds());
    println!();

    let records = load_customers(Path::new(input))?;
    let report = engine.assess_batch(records.iter().cloned());
    let alerts = alerts::build_alerts(records.iter().zip(&report.assessments), config.alert_limit);

    if let Some(path) = output {
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Cannot write {path}"))?;
    }
    let alerts_path = write_alerts(Path::new(alerts_dir), &alerts)?;

    print_summary(&report, &alerts, alerts_path.as_deref());
    Ok(())
}

/// Serve JSON-lines commands until `quit` or end of input. Every command
/// line gets exactly one reply line.
fn serve_ipc(engine: &ChurnRiskEngine, input: impl BufRead, out: &mut impl Write) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(reply) = respond(engine, &line) else {
            break;
        };
        writeln!(out, "{reply}")?;
        out.flush()?;
    }
    Ok(())
}

/// The reply to one command line; `None` on `quit`.
fn respond(engine: &ChurnRiskEngine, line: &str) -> Option<serde_json::Value> {
    let cmd = match serde_json::from_str::<IpcCommand>(line) {
        Ok(cmd) => cmd,
        Err(e) => return Some(error_reply(&e)),
    };

    let reply = match cmd {
        IpcCommand::Quit => return None,
        IpcCommand::Health => serde_json::to_value(health_state(engine)),
        IpcCommand::Assess { customer } => match engine.assess_input(customer) {
            Ok(assessment) => serde_json::to_value(assessment),
            Err(e) => return Some(error_reply(&e)),
        },
        IpcCommand::Batch { customers } => {
            match customers
                .into_iter()
                .map(CustomerRecord::from_input)
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(records) => serde_json::to_value(engine.assess_batch(records)),
                Err(e) => return Some(error_reply(&e)),
            }
        }
    };
    Some(reply.unwrap_or_else(|e| error_reply(&e)))
}

fn error_reply(err: &dyn std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": err.to_string() })
}

fn health_state(engine: &ChurnRiskEngine) -> HealthState {
    let registry = engine.registry();
    let preprocessor = engine.preprocessor();
    let status = if registry.is_empty() { "degraded" } else { "healthy" };
    HealthState {
        status,
        models_loaded: registry.available_kinds(),
        encoders_loaded: preprocessor.has_encoders(),
        scaler_loaded: preprocessor.has_scaler(),
    }
}

// ── Input ────────────────────────────────────────────────────────────────────

/// One untyped input row and where it came from.
struct RawRow {
    at:    String,
    value: serde_json::Value,
}

/// Read customers from a JSON array or a headed CSV. Each row is typed and
/// validated on its own; a bad row is logged and skipped.
fn load_customers(path: &Path) -> Result<Vec<CustomerRecord>> {
    let rows = match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => read_csv(path)?,
        _ => read_json(path)?,
    };

    let total = rows.len();
    let mut records = Vec::with_capacity(total);
    for row in rows {
        match parse_row(row.value) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("{}: skipped: {e}", row.at),
        }
    }

    log::info!("loaded {}/{} customers from {}", records.len(), total, path.display());
    Ok(records)
}

fn parse_row(value: serde_json::Value) -> Result<CustomerRecord> {
    let input: CustomerInput = serde_json::from_value(value)?;
    Ok(CustomerRecord::from_input(input)?)
}

fn read_json(path: &Path) -> Result<Vec<RawRow>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let elements: Vec<serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("Cannot parse {} as a JSON array", path.display()))?;

    Ok(elements
        .into_iter()
        .enumerate()
        .map(|(idx, value)| RawRow { at: format!("element {}", idx + 1), value })
        .collect())
}

/// Columns kept as text even when the cell looks numeric (e.g. "00042").
const TEXT_COLUMNS: &[&str] = &[
    "customer_id", "Customer_ID", "CustomerId",
    "geography", "Geography",
    "gender", "Gender",
    "card_type", "Card Type", "Card_Type", "CardType",
];

/// CSV cells are typed by shape (integer, float, text) and routed through
/// the same serde aliases as JSON input. Empty cells are absent fields.
fn read_csv(path: &Path) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let at = format!("row {}", idx + 1);
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::warn!("{at}: skipped: {e}");
                continue;
            }
        };

        let mut object = serde_json::Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }
            let value = if TEXT_COLUMNS.contains(&header) {
                serde_json::Value::from(cell)
            } else {
                cell_value(cell)
            };
            object.insert(header.to_string(), value);
        }
        rows.push(RawRow { at, value: serde_json::Value::Object(object) });
    }
    Ok(rows)
}

/// Whole numbers become integers whatever their spelling ("41", "41.0").
fn cell_value(cell: &str) -> serde_json::Value {
    if let Ok(i) = cell.parse::<i64>() {
        return i.into();
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e18 => (f as i64).into(),
        Ok(f) if f.is_finite() => f.into(),
        _ => cell.into(),
    }
}

// ── Output ───────────────────────────────────────────────────────────────────

fn write_alerts(dir: &Path, alerts: &[CustomerAlert]) -> Result<Option<PathBuf>> {
    if alerts.is_empty() {
        return Ok(None);
    }
    fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
    let filename = format!("churn_alerts_{}.json", chrono::Local::now().format("%Y%m%d"));
    let path = dir.join(filename);
    fs::write(&path, serde_json::to_string_pretty(alerts)?)
        .with_context(|| format!("Cannot write {}", path.display()))?;
    Ok(Some(path))
}

fn print_summary(report: &BatchReport, alerts: &[CustomerAlert], alerts_path: Option<&Path>) {
    let s = &report.summary;
    println!("=== BATCH SUMMARY ===");
    println!("  customers:       {}", report.total_customers);
    println!("  critical:        {}", s.critical);
    println!("  high:            {}", s.high);
    println!("  low:             {}", s.low);
    println!("  rule-based:      {}", s.rule_based);
    println!("  avg probability: {:.4}", s.avg_probability);

    println!();
    println!("=== TOP ALERTS ===");
    if alerts.is_empty() {
        println!("  (No customers at HIGH or CRITICAL risk)");
    } else {
        for a in alerts.iter().take(10) {
            println!(
                "  {} | {} | p={:.3} | {} | {}",
                a.customer_id, a.tier, a.probability, a.profile.geography, a.scoring_method
            );
        }
        if let Some(path) = alerts_path {
            println!("  written to {}", path.display());
        }
    }
}

// ── Args ─────────────────────────────────────────────────────────────────────

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("churn-runner-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const CSV_HEADER: &str = "Customer_ID,CreditScore,Geography,Gender,Age,Balance,NumOfProducts,\
HasCrCard,IsActiveMember,EstimatedSalary,Complain,Satisfaction Score,Card Type,\
Monthly_Transactions,Days_Since_Last_Transaction,Monthly_Logins,Support_Interactions";

    fn customer_json() -> Value {
        json!({
            "Customer_ID": "C-1", "CreditScore": 619, "Geography": "France", "Gender": "Female",
            "Age": 42, "Balance": 0.0, "NumOfProducts": 1, "HasCrCard": 1, "IsActiveMember": 1,
            "EstimatedSalary": 101348.88, "Complain": 0, "Satisfaction Score": 4,
            "Card Type": "GOLD", "Monthly_Transactions": 40, "Days_Since_Last_Transaction": 3,
            "Monthly_Logins": 12, "Support_Interactions": 0
        })
    }

    fn ipc_replies(lines: &str) -> Vec<Value> {
        let engine = ChurnRiskEngine::rules_only();
        let mut out = Vec::new();
        serve_ipc(&engine, lines.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    // ── Input ────────────────────────────────────────────────────────────────

    /// Export headers with spaces map onto the record, and ids keep their
    /// leading zeros.
    #[test]
    fn csv_export_headers_and_text_ids() {
        let csv = format!(
            "{CSV_HEADER}\n\
             00042,619,Germany,Female,41.0,0.0,1,1,0,101348.88,1,2,DIAMOND,32,12,6,3\n"
        );
        let path = scratch_file("export.csv", &csv);

        let records = load_customers(&path).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.customer_id.as_deref(), Some("00042"));
        assert_eq!(r.age, 41);
        assert_eq!(r.satisfaction_score, 2);
        assert_eq!(r.card_type, "DIAMOND");
        assert!(r.complained);
        assert!(!r.is_active_member);
    }

    /// A row that fails typing or validation is skipped; its neighbours load.
    #[test]
    fn bad_csv_rows_are_skipped() {
        let csv = format!(
            "{CSV_HEADER}\n\
             A,619,France,Male,forty,0,1,1,1,5000,0,3,GOLD,10,2,8,0\n\
             B,619,France,Male,40,0,1,1,1,5000,0,3,GOLD,10,2,8,0\n\
             C,619,France,Male,40,0,9,1,1,5000,0,3,GOLD,10,2,8,0\n\
             D,619,France,Male,40,0,1,1,1,5000,0,3,GOLD,10,2,8,0,extra\n"
        );
        let path = scratch_file("mixed.csv", &csv);

        let records = load_customers(&path).unwrap();
        let ids: Vec<_> = records.iter().filter_map(|r| r.customer_id.as_deref()).collect();
        assert_eq!(ids, vec!["B"]);
    }

    #[test]
    fn bad_json_elements_are_skipped() {
        let mut wrong_type = customer_json();
        wrong_type["Age"] = json!("forty");
        wrong_type["Customer_ID"] = json!("C-2");
        let mut whole_float = customer_json();
        whole_float["Age"] = json!(41.0);
        whole_float["Customer_ID"] = json!("C-3");
        let rows = json!([customer_json(), wrong_type, "not an object", whole_float]);
        let path = scratch_file("mixed.json", &rows.to_string());

        let records = load_customers(&path).unwrap();
        let ids: Vec<_> = records.iter().filter_map(|r| r.customer_id.as_deref()).collect();
        assert_eq!(ids, vec!["C-1", "C-3"]);
        assert_eq!(records[1].age, 41);
    }

    #[test]
    fn json_that_is_not_an_array_is_an_error() {
        let path = scratch_file("object.json", &customer_json().to_string());
        assert!(load_customers(&path).is_err());
    }

    #[test]
    fn cell_value_types_by_shape() {
        assert_eq!(cell_value("42"), json!(42));
        assert_eq!(cell_value("41.0"), json!(41));
        assert_eq!(cell_value("101348.88"), json!(101348.88));
        assert_eq!(cell_value("GOLD"), json!("GOLD"));
        assert_eq!(cell_value("NaN"), json!("NaN"));
    }

    // ── IPC ──────────────────────────────────────────────────────────────────

    /// Malformed lines and invalid customers get an error reply; the loop
    /// keeps serving.
    #[test]
    fn ipc_errors_are_replies() {
        let mut invalid = customer_json();
        invalid["Age"] = json!(12);
        let input = format!(
            "not json\n{}\n{}\n{}\n",
            json!({ "type": "assess", "customer": invalid }),
            json!({ "type": "batch", "customers": [customer_json(), invalid] }),
            json!({ "type": "health" }),
        );

        let replies = ipc_replies(&input);
        assert_eq!(replies.len(), 4);
        assert!(replies[0]["error"].is_string());
        let age_error = replies[1]["error"].as_str().unwrap();
        assert!(age_error.contains("age"), "unexpected reply: {age_error}");
        assert!(replies[2]["error"].is_string());
        assert_eq!(replies[3]["status"], "degraded");
    }

    #[test]
    fn ipc_assess_then_quit() {
        let input = format!(
            "{}\n\n{}\n{}\n",
            json!({ "type": "assess", "customer": customer_json() }),
            json!({ "type": "quit" }),
            json!({ "type": "health" }),
        );

        let replies = ipc_replies(&input);
        assert_eq!(replies.len(), 1, "nothing after quit is answered");
        assert_eq!(replies[0]["customer_id"], "C-1");
        assert_eq!(replies[0]["tier"], "LOW");
    }
}
