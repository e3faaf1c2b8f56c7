//! Bulk CSV verification.
//!
//! Reads rows whose first two columns are the claimed user agent and
//! the source address, classifies each row independently, and writes
//! the input back out with `bot_status` and `bot_name` columns
//! appended. Row order is preserved; rows carry no state across one
//! another.

use crate::engine::BotVerifier;
use crate::outcome::VerificationOutcome;
use anyhow::Context;
use std::io::{Read, Write};
use std::net::IpAddr;
use std::path::Path;
use tracing::warn;

/// Verify every row of `input_path` and write the extended rows to
/// `output_path`.
pub async fn bulk_verify(
    verifier: &BotVerifier,
    input_path: &Path,
    output_path: &Path,
) -> anyhow::Result<()> {
    let input = std::fs::File::open(input_path)
        .with_context(|| format!("failed to open {}", input_path.display()))?;
    let output = std::fs::File::create(output_path)
        .with_context(|| format!("failed to create {}", output_path.display()))?;
    process_csv(verifier, input, output).await
}

/// Classify each CSV row from `input` and write the results to `output`.
///
/// The header row is extended with `bot_status` and `bot_name`. A row
/// whose address does not parse is classified `unknown` rather than
/// failing the run; a row with fewer than two columns is a malformed
/// input and fails it.
pub async fn process_csv<R: Read, W: Write>(
    verifier: &BotVerifier,
    input: R,
    output: W,
) -> anyhow::Result<()> {
    let mut reader = csv::Reader::from_reader(input);
    let mut writer = csv::Writer::from_writer(output);

    let mut headers = reader
        .headers()
        .context("failed to read the csv header row")?
        .clone();
    headers.push_field("bot_status");
    headers.push_field("bot_name");
    writer.write_record(&headers)?;

    for (index, record) in reader.records().enumerate() {
        // header occupies line 1
        let line = index + 2;
        let mut record = record.with_context(|| format!("failed to read csv line {line}"))?;

        let (user_agent, address) = match (record.get(0), record.get(1)) {
            (Some(user_agent), Some(address)) => (user_agent.to_string(), address.to_string()),
            _ => anyhow::bail!("csv line {line} has fewer than two columns"),
        };

        let outcome = match address.parse::<IpAddr>() {
            Ok(address) => verifier.classify(&user_agent, address).await,
            Err(_) => {
                warn!(line, address = %address, "unparsable address, classifying unknown");
                VerificationOutcome::unknown()
            }
        };

        record.push_field(outcome.status.as_str());
        record.push_field(&outcome.bot_name);
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
