//! Shared fixtures for integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::Dispatch;

/// A search response shaped like the live API: one page nested as an
/// array, followed by a listing placed directly in the container.
pub fn sample_document() -> Value {
    json!({
        "success": true,
        "message": "",
        "response": [
            [
                {
                    "title": "Data Engineer",
                    "comapnyURL1": "https://www.linkedin.com/company/google",
                    "comapnyURL2": "https://www.linkedin.com/company/1441",
                    "companyId": 1441,
                    "companyUniversalName": "google",
                    "companyName": "Google",
                    "salaryInsights": "85000",
                    "applicants": 27,
                    "formattedLocation": "London, England, United Kingdom",
                    "formattedEmploymentStatus": "Full-time",
                    "formattedExperienceLevel": "Mid-Senior level",
                    "formattedIndustries": "Software Development",
                    "jobDescription": "Build pipelines.",
                    "inferredBenefits": "Medical insurance",
                    "jobFunctions": ["Engineering"],
                    "companyApplyUrl": "https://careers.google.com/jobs/1",
                    "jobPostingUrl": "https://www.linkedin.com/jobs/view/1",
                    "listedAt": "2024-05-01T10:00:00+00:00"
                },
                {
                    "title": "Senior Data Engineer",
                    "comapnyURL1": "https://www.linkedin.com/company/monzo",
                    "comapnyURL2": "https://www.linkedin.com/company/9217",
                    "companyId": "9217",
                    "companyUniversalName": "monzo",
                    "companyName": "Monzo",
                    "salaryInsights": null,
                    "applicants": "n/a",
                    "formattedLocation": "London, England, United Kingdom",
                    "formattedEmploymentStatus": "Full-time",
                    "formattedExperienceLevel": "Director",
                    "formattedIndustries": "Financial Services",
                    "jobDescription": "Own the platform.",
                    "inferredBenefits": null,
                    "jobFunctions": ["Engineering", "IT"],
                    "companyApplyUrl": "https://monzo.com/careers/2",
                    "jobPostingUrl": "https://www.linkedin.com/jobs/view/2",
                    "listedAt": 1714557600000i64
                }
            ],
            {
                "title": "Analytics Engineer",
                "comapnyURL1": "https://www.linkedin.com/company/acme",
                "comapnyURL2": "https://www.linkedin.com/company/acme-2",
                "companyId": "abc",
                "companyUniversalName": "acme",
                "companyName": "Acme",
                "salaryInsights": "60000.50",
                "applicants": "12",
                "formattedLocation": "Remote",
                "formattedEmploymentStatus": "Contract",
                "formattedExperienceLevel": "Associate",
                "formattedIndustries": "Retail",
                "jobDescription": "Model things.",
                "inferredBenefits": "Pension",
                "jobFunctions": [],
                "companyApplyUrl": "https://acme.example/jobs/3",
                "jobPostingUrl": "https://www.linkedin.com/jobs/view/3",
                "listedAt": "last tuesday"
            }
        ]
    })
}

/// Columns the sample normalizes to, in order
pub const SAMPLE_COLUMNS: &[&str] = &[
    "JobTitle",
    "CompanyURL2",
    "CompanyId",
    "CompanyName",
    "SalaryInsights",
    "NoOfApplicants",
    "CompanyLocation",
    "EmploymentStatus",
    "ExperienceLevel",
    "Industries",
    "Benefits",
    "JobPostingUrl",
    "PostedDate",
];

/// Write `document` to `<dir>/<name>` and return the path
pub fn write_document(dir: &Path, name: &str, document: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(document).unwrap()).unwrap();
    path
}

/// In-memory sink for log output
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Plain-text dispatcher writing into this buffer
    pub fn dispatch(&self) -> Dispatch {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || sink.clone())
            .finish();
        Dispatch::new(subscriber)
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
