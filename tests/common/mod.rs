//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

/// Eight Telco-style customer records. The last row has a blank TotalCharges.
pub const TELCO_CSV: &str = "\
customerID,gender,SeniorCitizen,Partner,Dependents,tenure,PhoneService,InternetService,Contract,PaperlessBilling,MonthlyCharges,TotalCharges,Churn
7590-VHVEG,Female,0,Yes,No,1,No,DSL,Month-to-month,Yes,29.85,29.85,No
5575-GNVDE,Male,0,No,No,34,Yes,DSL,One year,No,56.95,1889.5,No
3668-QPYBK,Male,0,No,No,2,Yes,DSL,Month-to-month,Yes,53.85,108.15,Yes
7795-CFOCW,Male,0,No,No,45,No,DSL,One year,No,42.30,1840.75,No
9237-HQITU,Female,0,No,No,2,Yes,Fiber optic,Month-to-month,Yes,70.70,151.65,Yes
9305-CDSKC,Female,0,No,No,8,Yes,Fiber optic,Month-to-month,Yes,99.65,820.5,Yes
1452-KIOVK,Male,0,No,Yes,22,Yes,Fiber optic,Month-to-month,Yes,89.10,1949.4,No
4472-LVYGI,Female,1,Yes,Yes,0,No,DSL,Two year,Yes,52.55, ,No
";

/// Feature columns the default configuration produces from [`TELCO_CSV`], in order
pub const TELCO_FEATURES: &[&str] = &[
    "gender",
    "SeniorCitizen",
    "Partner",
    "Dependents",
    "tenure",
    "PhoneService",
    "PaperlessBilling",
    "MonthlyCharges",
    "TotalCharges",
    "InternetService_DSL",
    "InternetService_Fiber optic",
    "Contract_Month-to-month",
    "Contract_One year",
    "Contract_Two year",
];

/// Write `contents` to `<tempdir>/<name>`
pub fn write_file(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    (temp_dir, path)
}

/// Create a temporary directory with the Telco fixture CSV
pub fn create_telco_csv() -> (TempDir, PathBuf) {
    write_file("telco.csv", TELCO_CSV)
}

/// Population mean and standard deviation
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

pub fn assert_standardized(name: &str, values: &[f64]) {
    let (mean, std) = mean_std(values);
    assert!(mean.abs() < 1e-9, "column '{}' has mean {}", name, mean);
    assert!((std - 1.0).abs() < 1e-9, "column '{}' has std {}", name, std);
}
