//! Static, read-only data behind the header grader: which headers are checked,
//! what each one is worth, how to fix its absence, and what each grade means.
//! Keeping it in one table means the grader, the recommendations and the
//! tests all agree on the same ordering.

use crate::core::models::Grade;

/// One security header the grader looks for.
pub struct SecurityHeader {
    /// Canonical spelling used in findings and reports.
    pub name: &'static str,
    /// Points added to the score when the header is present.
    pub weight: u8,
    /// Advice emitted when the header is missing.
    pub remediation: &'static str,
}

/// The checked headers, in the order they are reported.
pub static SECURITY_HEADERS: &[SecurityHeader] = &[
    SecurityHeader {
        name: "Content-Security-Policy",
        weight: 3,
        remediation: "Implement CSP to prevent XSS attacks",
    },
    SecurityHeader {
        name: "Strict-Transport-Security",
        weight: 3,
        remediation: "Enable HSTS to enforce HTTPS",
    },
    SecurityHeader {
        name: "X-Frame-Options",
        weight: 2,
        remediation: "Set to 'DENY' to prevent clickjacking",
    },
    SecurityHeader {
        name: "X-Content-Type-Options",
        weight: 2,
        remediation: "Set to 'nosniff' to prevent MIME sniffing",
    },
    SecurityHeader {
        name: "Referrer-Policy",
        weight: 1,
        remediation: "Set to 'no-referrer' or 'strict-origin'",
    },
    SecurityHeader {
        name: "Feature-Policy",
        weight: 1,
        remediation: "Restrict access to browser features",
    },
];

/// Placeholder for `Server` / `X-Powered-By` when the response omits them.
pub const NOT_DISCLOSED: &str = "Not disclosed";

/// Score thresholds, highest first. Anything below the last one is a D.
pub static GRADE_THRESHOLDS: &[(u8, Grade)] = &[(8, Grade::A), (5, Grade::B), (3, Grade::C)];

pub fn grade_for_score(score: u8) -> Grade {
    GRADE_THRESHOLDS
        .iter()
        .find(|(min, _)| score >= *min)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::D)
}

pub fn grade_explanation(grade: Grade) -> &'static str {
    match grade {
        Grade::A => "Excellent security headers implementation",
        Grade::B => "Good security headers but room for improvement",
        Grade::C => "Basic security headers implemented",
        Grade::D => "Poor security headers implementation",
    }
}

/// Looks up the remediation for a header by canonical name.
pub fn remediation_for(name: &str) -> Option<&'static str> {
    SECURITY_HEADERS.iter().find(|h| h.name == name).map(|h| h.remediation)
}

/// Highest score the header set can produce.
pub fn max_score() -> u8 {
    SECURITY_HEADERS.iter().map(|h| h.weight).sum()
}
