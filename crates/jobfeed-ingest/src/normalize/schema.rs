// Canonical output schema for job listings

/// Top-level field of the API response holding the listings
pub const CONTAINER_FIELD: &str = "response";

/// Source field -> canonical column.
///
/// `comapnyURL*` is the upstream API's own spelling.
pub const COLUMN_RENAMES: &[(&str, &str)] = &[
    ("title", "JobTitle"),
    ("comapnyURL1", "CompanyURL1"),
    ("comapnyURL2", "CompanyURL2"),
    ("companyId", "CompanyId"),
    ("companyUniversalName", "CompanyUniversalName"),
    ("companyName", "CompanyName"),
    ("salaryInsights", "SalaryInsights"),
    ("applicants", "NoOfApplicants"),
    ("formattedLocation", "CompanyLocation"),
    ("formattedEmploymentStatus", "EmploymentStatus"),
    ("formattedExperienceLevel", "ExperienceLevel"),
    ("formattedIndustries", "Industries"),
    ("jobDescription", "JobDescription"),
    ("inferredBenefits", "Benefits"),
    ("jobFunctions", "JobFunctions"),
    ("companyApplyUrl", "CompanyApplicationUrl"),
    ("jobPostingUrl", "JobPostingUrl"),
    ("listedAt", "PostedDate"),
];

/// Identifier and measure columns coerced to numbers
pub const NUMERIC_COLUMNS: &[&str] = &["CompanyId", "SalaryInsights", "NoOfApplicants"];

/// Posting timestamp column
pub const POSTED_DATE_COLUMN: &str = "PostedDate";

/// Columns removed before storage
pub const DROPPED_COLUMNS: &[&str] = &[
    "CompanyURL1",
    "CompanyUniversalName",
    "JobFunctions",
    "CompanyApplicationUrl",
    "JobDescription",
];
