use std::io::Write;
use std::net::Ipv4Addr;
use std::time::Duration;

use ::time::{format_description::well_known, OffsetDateTime};
use anyhow::{Context as _, Result};
use log::debug;
use tokio::time;

use crate::config::{ScanConfig, ScanMode};
use crate::master::MasterSource;
use crate::reader;
use crate::types::{ProbeHit, ProbeOutcome, ScanReport};

/// Pause between candidates. Keeps a shared serial medium from being
/// overrun and a network segment from being flooded.
pub const PROBE_PACING: Duration = Duration::from_millis(30);

/// Run the scan mode selected by the configuration over its whole
/// candidate space, writing one event line, one running-flag line, and
/// one blank separator per candidate to `out`.
///
/// A failed candidate never aborts the enumeration; the only fatal
/// failure is the pre-loop master acquisition of the `Addresses` mode.
pub async fn run_scan<W: Write>(
    source: &dyn MasterSource,
    config: &ScanConfig,
    out: &mut W,
) -> Result<ScanReport> {
    debug!("starting {:?} scan", config.mode);
    match config.mode {
        ScanMode::Addresses => scan_addresses(source, config, out).await,
        ScanMode::Registers => scan_registers(source, config, out).await,
        ScanMode::Ips => scan_ips(source, config, out).await,
    }
}

/// Walk unit addresses 0..=255 on one shared medium.
///
/// The master is acquired once, before the loop: the varying dimension
/// is the unit argument of each read, not a transport property.
pub async fn scan_addresses<W: Write>(
    source: &dyn MasterSource,
    config: &ScanConfig,
    out: &mut W,
) -> Result<ScanReport> {
    let mut master = source
        .acquire(config)
        .await
        .context("failed to acquire the scan master")?;

    let mut report = ScanReport::default();
    for unit in 0..=u8::MAX {
        let outcome = reader::probe(
            master.as_mut(),
            config.register_kind,
            unit,
            config.register,
            config.count,
        )
        .await;
        let candidate = Candidate::Unit(unit);
        record(&mut report, &candidate, &outcome);
        report_candidate(out, &candidate, &outcome, report.any_success)?;
        time::sleep(PROBE_PACING).await;
    }
    Ok(report)
}

/// Walk register offsets 0, 5, 10, … below the 16-bit limit.
///
/// A fresh master is acquired per candidate: repeated isolated
/// transactions rather than a persistent session, since real masters
/// degrade under abandoned-session pressure. Intentionally asymmetric
/// with [`scan_addresses`].
pub async fn scan_registers<W: Write>(
    source: &dyn MasterSource,
    config: &ScanConfig,
    out: &mut W,
) -> Result<ScanReport> {
    let mut report = ScanReport::default();
    for offset in (0u16..0xFFFF).step_by(5) {
        let outcome = match source.acquire(config).await {
            Ok(mut master) => {
                reader::probe(
                    master.as_mut(),
                    config.register_kind,
                    config.unit,
                    offset,
                    config.count,
                )
                .await
            }
            Err(err) => ProbeOutcome::from(err),
        };
        let candidate = Candidate::Register(offset);
        record(&mut report, &candidate, &outcome);
        report_candidate(out, &candidate, &outcome, report.any_success)?;
        time::sleep(PROBE_PACING).await;
    }
    Ok(report)
}

/// Sweep the /24 around the configured host: the last octet varies
/// 0..=255, the first three octets, unit, and register stay fixed.
///
/// Every candidate is a distinct remote host, so each gets its own
/// connection attempt.
pub async fn scan_ips<W: Write>(
    source: &dyn MasterSource,
    config: &ScanConfig,
    out: &mut W,
) -> Result<ScanReport> {
    let base = config.net.host.octets();
    let mut report = ScanReport::default();
    for octet in 0..=u8::MAX {
        let host = Ipv4Addr::new(base[0], base[1], base[2], octet);
        let mut target = config.clone();
        target.net.host = host;
        let outcome = match source.acquire(&target).await {
            Ok(mut master) => {
                reader::probe(
                    master.as_mut(),
                    config.register_kind,
                    config.unit,
                    config.register,
                    config.count,
                )
                .await
            }
            Err(err) => ProbeOutcome::from(err),
        };
        let candidate = Candidate::Host(host);
        record(&mut report, &candidate, &outcome);
        report_candidate(out, &candidate, &outcome, report.any_success)?;
        time::sleep(PROBE_PACING).await;
    }
    Ok(report)
}

/// Identity of one probed candidate.
enum Candidate {
    Unit(u8),
    Register(u16),
    Host(Ipv4Addr),
}

impl Candidate {
    fn label(&self) -> String {
        match self {
            Candidate::Unit(unit) => unit.to_string(),
            Candidate::Register(offset) => offset.to_string(),
            Candidate::Host(host) => host.to_string(),
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            Candidate::Register(_) => "register",
            _ => "address",
        }
    }
}

/// Fold one outcome into the running report. The success flag is set on
/// the first hit and never cleared.
fn record(report: &mut ScanReport, candidate: &Candidate, outcome: &ProbeOutcome) {
    report.attempts += 1;
    if let ProbeOutcome::Values(values) = outcome {
        report.hit_count += 1;
        report.any_success = true;
        report.hits.push(ProbeHit {
            candidate: candidate.label(),
            values: values.clone(),
            timestamp: now_rfc3339(),
        });
    }
}

/// One event line, the running-flag line, and a blank separator.
fn report_candidate(
    out: &mut impl Write,
    candidate: &Candidate,
    outcome: &ProbeOutcome,
    any_success: bool,
) -> std::io::Result<()> {
    match outcome {
        ProbeOutcome::Values(values) => {
            let joined = values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",");
            match candidate {
                Candidate::Register(offset) => {
                    writeln!(out, "----Valid response on register {offset}----{joined}")?
                }
                other => writeln!(
                    out,
                    "----Modbus master found on {}---- {}",
                    other.label(),
                    joined
                )?,
            }
        }
        ProbeOutcome::Timeout(msg) => writeln!(
            out,
            "Timeout on {} {} - {}",
            candidate.noun(),
            candidate.label(),
            msg
        )?,
        ProbeOutcome::Error(msg) => writeln!(
            out,
            "Error on {} {} - {}",
            candidate.noun(),
            candidate.label(),
            msg
        )?,
    }
    writeln!(out, "------------------{any_success}------------------------")?;
    writeln!(out)?;
    Ok(())
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
