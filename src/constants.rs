/// Column names consumed from the spreadsheet exports.
/// These must match the header row of the sheets exactly.

// Elections sheet
pub const COL_STATE: &str = "State";
pub const COL_GUBERNATORIAL: &str = "Gubernatorial?";
pub const COL_HOUSE: &str = "House of Reps?";
pub const COL_REFERENDUMS: &str = "Statewide Referendums?";
pub const COL_OTHER: &str = "Other Relevant?";

// Logistics sheet
pub const COL_REGISTRATION_DEADLINE: &str = "Registration Deadline";
pub const COL_ONLINE_REGISTRATION: &str = "Online registration? (REQUIRES STATE ID)";
pub const COL_CHECK_REGISTRATION: &str = "Check registration?";

/// Cell value meaning "no data" in either sheet
pub const NOT_APPLICABLE: &str = "N/A";

/// Cell value marking an affirmative yes/no column
pub const AFFIRMATIVE: &str = "YES";

/// Rows whose State cell starts with this are section headers or notes
pub const DEFAULT_RESERVED_ROW_PREFIX: &str = "**";

// Fixed labels written into generated elections
pub const GOVERNOR_TITLE: &str = "Governor";
pub const GOVERNOR_STAKES: &str = "Open seat gubernatorial race.";
pub const HOUSE_TITLE_PREFIX: &str = "U.S. House - ";
pub const REFERENDUM_STAKES: &str = "Statewide ballot measures.";

/// Timestamp format for `lastUpdated`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Long date used by the deadline fallback ("October 05, 2025")
pub const DEADLINE_DATE_FORMAT: &str = "%B %d, %Y";

/// Long date used for election dates ("November 4, 2025")
pub const ELECTION_DATE_FORMAT: &str = "%B %-d, %Y";

// Source names used in logs and reports
pub const DEFAULTS_SOURCE: &str = "defaults";
pub const ELECTIONS_SHEET_SOURCE: &str = "elections_sheet";
pub const LOGISTICS_SHEET_SOURCE: &str = "logistics_sheet";
pub const SCRAPED_PAGES_SOURCE: &str = "scraped_pages";
