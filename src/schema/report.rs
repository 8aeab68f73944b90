use crate::core::HtmlContract;

/// Headings every procurement report must contain, in document order.
pub const REPORT_SECTIONS: &[&str] = &[
    "Executive Summary",
    "Introduction",
    "Methodology",
    "Findings",
    "Analysis",
    "Recommendations",
    "Conclusion",
    "Appendices",
];

pub fn report_contract() -> HtmlContract {
    HtmlContract::with_sections(REPORT_SECTIONS)
}
