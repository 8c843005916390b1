use license_request::{LicenseRequest, Parameters};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("LICENSE_SERVER_URL")
        .unwrap_or_else(|_| "data:text/plain;base64,SGVsbG8sIGRhdGEh".to_owned());
    let challenge = std::env::args().nth(1).map(String::into_bytes);
    let parameters = Parameters::from_env().map_err(anyhow::Error::msg)?;

    let request = LicenseRequest::new(url, challenge).with_parameters(parameters);
    let license = request.send().await?;

    println!(
        "received {} bytes after {} attempt(s), last backoff {:?}",
        license.len(),
        request.attempts(),
        request.last_delay()
    );
    Ok(())
}
