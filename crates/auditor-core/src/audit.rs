//! Security audit prompt and reply parsing.
//!
//! The contract text is never analysed here. It is wrapped in a fixed
//! instruction template, and the model's reply is read back line by line for
//! the summary fields the template asks for.

use crate::relay::{ChatMessage, ChatRequest};

/// Characters of contract source included in an audit prompt.
pub const MAX_CONTRACT_CHARS: usize = 2000;

const AUDITOR_SYSTEM_PROMPT: &str = "You are an expert smart contract security auditor.";

const DEFAULT_SCORE: u32 = 50;
const DEFAULT_SUMMARY: &str = "Analysis complete";

/// Build the audit prompt for a contract snippet
pub fn build_audit_prompt(contract: &str) -> String {
    let snippet: String = contract.chars().take(MAX_CONTRACT_CHARS).collect();

    let mut prompt = String::new();
    prompt.push_str("Analyze this Solidity smart contract for security vulnerabilities:\n\n");
    prompt.push_str(&snippet);
    prompt.push_str("\n\nCheck for:\n");
    prompt.push_str("1. Reentrancy attacks\n");
    prompt.push_str("2. Access control issues\n");
    prompt.push_str("3. Integer overflow/underflow\n");
    prompt.push_str("4. Unchecked external calls\n");
    prompt.push_str("5. Front-running vulnerabilities\n\n");
    prompt.push_str("Respond EXACTLY in this format:\n");
    prompt.push_str("SCORE: [0-100]\n");
    prompt.push_str("CRITICAL: [number]\n");
    prompt.push_str("HIGH: [number]\n");
    prompt.push_str("MEDIUM: [number]\n");
    prompt.push_str("SUMMARY: [one line summary]\n");
    prompt.push_str("ISSUES: [comma-separated list]");

    prompt
}

pub fn audit_request(model: &str, contract: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(AUDITOR_SYSTEM_PROMPT),
            ChatMessage::user(build_audit_prompt(contract)),
        ],
    }
}

/// Summary fields read back from an audit reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub score: u32,
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub summary: String,
    pub issues: Vec<String>,
    pub raw: String,
}

impl AuditReport {
    /// Parse the reply text. Fields the model left out or garbled keep their defaults.
    pub fn parse(reply: &str) -> Self {
        let mut report = Self {
            score: DEFAULT_SCORE,
            critical: 0,
            high: 0,
            medium: 0,
            summary: DEFAULT_SUMMARY.to_string(),
            issues: Vec::new(),
            raw: reply.to_string(),
        };

        for line in reply.lines() {
            let line = line.trim();
            if line.contains("SCORE:") {
                report.score = count_field(line).unwrap_or(report.score);
            } else if line.contains("CRITICAL:") {
                report.critical = count_field(line).unwrap_or(report.critical);
            } else if line.contains("HIGH:") {
                report.high = count_field(line).unwrap_or(report.high);
            } else if line.contains("MEDIUM:") {
                report.medium = count_field(line).unwrap_or(report.medium);
            } else if line.contains("SUMMARY:") {
                if let Some((_, rest)) = line.split_once(':') {
                    report.summary = rest.trim().to_string();
                }
            } else if line.contains("ISSUES:") {
                if let Some((_, rest)) = line.split_once(':') {
                    report.issues = rest
                        .split(',')
                        .map(str::trim)
                        .filter(|issue| !issue.is_empty())
                        .map(str::to_string)
                        .collect();
                }
            }
        }

        report
    }
}

/// Digits between the first and second `:` of a line, read as one number.
fn count_field(line: &str) -> Option<u32> {
    let value = line.split(':').nth(1)?;
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}
