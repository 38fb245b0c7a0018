//! Check whether a certificate has been revoked by its issuer.
//!
//! Usage: revocation_check <subject.pem> <issuer.pem> [ocsp-url]

use revoq::{ParsedCertificate, Revoq};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(subject_path), Some(issuer_path)) = (args.next(), args.next()) else {
        eprintln!("usage: revocation_check <subject.pem> <issuer.pem> [ocsp-url]");
        std::process::exit(2);
    };
    let ocsp_url = args.next();

    let subject = ParsedCertificate::from_pem(&std::fs::read(subject_path)?)?;
    let issuer = ParsedCertificate::from_pem(&std::fs::read(issuer_path)?)?;

    let engine = Revoq::engine();
    let result = engine
        .check_with_responder(&subject, &issuer, ocsp_url.as_deref())
        .await;

    let report = engine.last_report();
    println!("policy:  {}", report.policy);
    for method in &report.methods_tried {
        println!("tried:   {method}");
    }
    if let Some(status) = report.ocsp_status {
        println!("ocsp:    {status}");
    }
    if let Some(error) = &report.ocsp_error {
        println!("         {error}");
    }
    if let Some(status) = report.crl_status {
        println!("crl:     {status}");
    }
    if let Some(error) = &report.crl_error {
        println!("         {error}");
    }

    match result {
        Ok(true) => println!("verdict: not revoked"),
        Ok(false) => println!("verdict: REVOKED"),
        Err(e) => {
            println!("verdict: undetermined ({e})");
            std::process::exit(1);
        }
    }
    Ok(())
}
