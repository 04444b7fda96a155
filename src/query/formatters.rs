use crate::amount::format_amount;
use crate::portfolio::Portfolio;
use crate::repository::Contact;
use crate::tokens::{ALPH_TOKEN_ID, TokenKind};
use crate::transactions::TransactionSummary;
use chrono::{TimeZone, Utc};
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde_json::json;

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

fn kind_label(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::ListedFt => "listed",
        TokenKind::UnlistedFt => "unlisted",
        TokenKind::Nft => "nft",
        TokenKind::NonStandard => "non-standard",
    }
}

fn format_worth(worth: Option<f64>) -> String {
    worth.map(|w| format!("{w:.2}")).unwrap_or_else(|| "-".to_string())
}

fn format_timestamp(millis: u64) -> String {
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn format_hash(hash: &str) -> String {
    let chars: Vec<char> = hash.chars().collect();
    if chars.len() > 16 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 6..].iter().collect();
        format!("{head}...{tail}")
    } else {
        hash.to_string()
    }
}

pub fn format_portfolio(portfolio: &Portfolio, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_portfolio_table(portfolio),
        OutputFormat::Json => format_portfolio_json(portfolio),
        OutputFormat::Csv => format_portfolio_csv(portfolio),
    }
}

fn format_portfolio_table(portfolio: &Portfolio) -> String {
    if portfolio.tokens.is_empty() {
        return "No tokens found.".to_string();
    }

    let worth_header = format!("Worth ({})", portfolio.currency.to_uppercase());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            "Symbol",
            "Name",
            "Type",
            "Total",
            "Available",
            "Locked",
            worth_header.as_str(),
        ]);

    for token in &portfolio.tokens {
        table.add_row(vec![
            Cell::new(token.symbol.as_deref().unwrap_or("-")),
            Cell::new(if token.name.is_empty() {
                format_hash(&token.id)
            } else {
                token.name.clone()
            }),
            Cell::new(kind_label(token.kind)),
            Cell::new(format_amount(token.balance.total, token.decimals)),
            Cell::new(format_amount(token.balance.available, token.decimals)),
            Cell::new(format_amount(token.balance.locked, token.decimals)),
            Cell::new(format_worth(token.worth)),
        ]);
    }

    let mut output = table.to_string();
    output.push_str(&format!(
        "\nTotal worth: {:.2} {}",
        portfolio.total_worth,
        portfolio.currency.to_uppercase()
    ));
    if portfolio.is_loading {
        output.push_str("\nSome addresses are still loading.");
    }
    if portfolio.has_error {
        output.push_str(&format!(
            "\nSome balances could not be loaded: {}",
            portfolio.failed_addresses.join(", ")
        ));
    }
    output
}

fn format_portfolio_json(portfolio: &Portfolio) -> String {
    let tokens: Vec<_> = portfolio
        .tokens
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "type": kind_label(t.kind),
                "name": t.name,
                "symbol": t.symbol,
                "decimals": t.decimals,
                "total": format_amount(t.balance.total, t.decimals),
                "available": format_amount(t.balance.available, t.decimals),
                "locked": format_amount(t.balance.locked, t.decimals),
                "total_raw": t.balance.total.to_string(),
                "worth": t.worth,
            })
        })
        .collect();

    let output = json!({
        "network": portfolio.network.as_str(),
        "currency": portfolio.currency,
        "total_worth": portfolio.total_worth,
        "is_loading": portfolio.is_loading,
        "has_error": portfolio.has_error,
        "failed_addresses": portfolio.failed_addresses,
        "tokens": tokens,
    });

    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

fn format_portfolio_csv(portfolio: &Portfolio) -> String {
    let mut wtr = Writer::from_writer(vec![]);

    let _ = wtr.write_record([
        "id", "type", "name", "symbol", "decimals", "total", "available", "locked", "worth",
    ]);

    for t in &portfolio.tokens {
        let _ = wtr.write_record([
            t.id.as_str(),
            kind_label(t.kind),
            t.name.as_str(),
            t.symbol.as_deref().unwrap_or(""),
            &t.decimals.to_string(),
            &format_amount(t.balance.total, t.decimals),
            &format_amount(t.balance.available, t.decimals),
            &format_amount(t.balance.locked, t.decimals),
            &t.worth.map(|w| w.to_string()).unwrap_or_default(),
        ]);
    }

    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

fn token_changes(summary: &TransactionSummary) -> String {
    summary
        .deltas
        .tokens
        .iter()
        .filter(|(id, _)| id.as_str() != ALPH_TOKEN_ID)
        .map(|(id, delta)| format!("{} {}", delta.format(0), format_hash(id)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_transactions(transactions: &[TransactionSummary], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_transactions_table(transactions),
        OutputFormat::Json => format_transactions_json(transactions),
        OutputFormat::Csv => format_transactions_csv(transactions),
    }
}

fn format_transactions_table(transactions: &[TransactionSummary]) -> String {
    if transactions.is_empty() {
        return "No transactions found.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Time", "Type", "ALPH", "Tokens", "Tx Hash"]);

    for tx in transactions {
        table.add_row(vec![
            Cell::new(format_timestamp(tx.timestamp)),
            Cell::new(tx.info_type.label()),
            Cell::new(tx.alph_display()),
            Cell::new(token_changes(tx)),
            Cell::new(format_hash(&tx.hash)),
        ]);
    }

    table.to_string()
}

fn format_transactions_json(transactions: &[TransactionSummary]) -> String {
    let json_transactions: Vec<_> = transactions
        .iter()
        .map(|tx| {
            let tokens: serde_json::Map<String, serde_json::Value> = tx
                .deltas
                .tokens
                .iter()
                .map(|(id, delta)| (id.clone(), json!(delta.format(0))))
                .collect();
            json!({
                "hash": tx.hash,
                "timestamp": tx.timestamp,
                "type": tx.info_type,
                "label": tx.info_type.label(),
                "alph": tx.alph_display(),
                "tokens": tokens,
            })
        })
        .collect();

    serde_json::to_string_pretty(&json_transactions).unwrap_or_else(|_| "[]".to_string())
}

fn format_transactions_csv(transactions: &[TransactionSummary]) -> String {
    let mut wtr = Writer::from_writer(vec![]);

    let _ = wtr.write_record(["hash", "timestamp", "type", "alph", "tokens"]);

    for tx in transactions {
        let _ = wtr.write_record([
            tx.hash.as_str(),
            &tx.timestamp.to_string(),
            tx.info_type.label(),
            &tx.alph_display(),
            &token_changes(tx),
        ]);
    }

    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

pub fn format_contacts(contacts: &[Contact], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if contacts.is_empty() {
                return "No contacts saved.".to_string();
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["Name", "Address"]);
            for contact in contacts {
                table.add_row(vec![Cell::new(&contact.name), Cell::new(&contact.address)]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(contacts).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["name", "address"]);
            for contact in contacts {
                let _ = wtr.write_record([contact.name.as_str(), contact.address.as_str()]);
            }
            String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
        }
    }
}
