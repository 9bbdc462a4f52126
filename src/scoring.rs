//! Lead scoring
//!
//! Maps lead-form fields to a sales-readiness score in [0, 100].
//! Scoring is additive across independently-weighted buckets:
//! - Email quality (business domain vs. free-mail vs. malformed)
//! - Company name and phone presence
//! - Company size, urgency, and industry tiers (fixed lookup tables)
//! - Challenge count, capped per bucket
//!
//! The total is clamped to 100 regardless of how many bonuses fire; the
//! score is consumed downstream as a percentage-like signal. The scorer is
//! a pure function with no side effects, safe to call on every keystroke.

use crate::types::{CompanySize, Industry, LeadScoreInputs, Urgency};
use std::collections::HashSet;

/// Points for a well-formed email on a free-mail domain
const EMAIL_FREE_MAIL: u32 = 5;
/// Points for a well-formed email on a business domain
const EMAIL_BUSINESS: u32 = 15;
/// Points for a non-blank company name
const COMPANY_NAME_PRESENT: u32 = 10;
/// Points for a plausible phone number
const PHONE_PRESENT: u32 = 10;
/// Points per distinct challenge selected
const CHALLENGE_PER_ITEM: u32 = 4;
/// Cap on the challenge bucket, independent of the global clamp
const CHALLENGE_BUCKET_CAP: u32 = 12;
/// Hard ceiling on the total score
const SCORE_CEILING: u32 = 100;

/// Common personal-mail domains that disqualify an email from the
/// business-grade bonus
const FREE_MAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "proton.me",
    "protonmail.com",
    "mail.com",
    "gmx.com",
    "yandex.com",
    "live.com",
    "msn.com",
    "zoho.com",
];

/// Lead scorer
pub struct LeadScorer;

impl LeadScorer {
    /// Score a lead submission. Deterministic; never fails.
    pub fn score(inputs: &LeadScoreInputs) -> u8 {
        let mut total = email_points(&inputs.email);

        if inputs
            .company_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
        {
            total += COMPANY_NAME_PRESENT;
        }

        if inputs.phone.as_deref().is_some_and(is_plausible_phone) {
            total += PHONE_PRESENT;
        }

        if let Some(size) = &inputs.company_size {
            total += company_size_points(size);
        }

        if let Some(urgency) = &inputs.urgency {
            total += urgency_points(urgency);
        }

        if let Some(industry) = &inputs.industry {
            total += industry_points(industry);
        }

        total += challenge_points(&inputs.challenges);

        total.min(SCORE_CEILING) as u8
    }
}

/// Email bucket: malformed earns zero, free-mail earns the base, a
/// business domain earns the full bucket
fn email_points(email: &str) -> u32 {
    let domain = match email_domain(email) {
        Some(domain) => domain,
        None => return 0,
    };

    if FREE_MAIL_DOMAINS.contains(&domain.as_str()) {
        EMAIL_FREE_MAIL
    } else {
        EMAIL_BUSINESS
    }
}

/// Structural email check; returns the lowercased domain when well-formed
fn email_domain(email: &str) -> Option<String> {
    let email = email.trim();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    // A second '@', whitespace, or a dotless/edge-dotted domain is malformed
    if domain.contains('@') || email.chars().any(char::is_whitespace) {
        return None;
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return None;
    }
    Some(domain.to_ascii_lowercase())
}

fn is_plausible_phone(phone: &str) -> bool {
    phone.chars().filter(char::is_ascii_digit).count() >= 7
}

fn company_size_points(size: &CompanySize) -> u32 {
    match size {
        CompanySize::Solo => 3,
        CompanySize::Small => 8,
        CompanySize::Medium => 12,
        CompanySize::Large => 16,
        CompanySize::Enterprise => 20,
        CompanySize::Other(_) => 0,
    }
}

fn urgency_points(urgency: &Urgency) -> u32 {
    match urgency {
        Urgency::Exploring => 3,
        Urgency::NextQuarter => 10,
        Urgency::NextMonth => 15,
        Urgency::Immediate => 20,
        Urgency::Other(_) => 0,
    }
}

fn industry_points(industry: &Industry) -> u32 {
    match industry {
        Industry::Technology => 10,
        Industry::Finance => 15,
        Industry::Healthcare => 12,
        Industry::Manufacturing => 8,
        Industry::Retail => 6,
        Industry::Education => 5,
        Industry::Other => 3,
        Industry::Unknown(_) => 0,
    }
}

/// Challenge bucket: distinct selections count, duplicates do not
fn challenge_points(challenges: &[String]) -> u32 {
    let distinct: HashSet<&str> = challenges
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    (distinct.len() as u32 * CHALLENGE_PER_ITEM).min(CHALLENGE_BUCKET_CAP)
}
