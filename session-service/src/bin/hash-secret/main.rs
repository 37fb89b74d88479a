use std::io::BufRead;

use auth::SecretHasher;
use session_service::config::Config;

/// Read a plaintext secret from stdin and print its stored-hash form.
///
/// Uses the configured hashing cost so seeded principals verify at the
/// same cost as everything else.
fn main() -> Result<(), anyhow::Error> {
    session_service::telemetry::init("session_service=info,hash_secret=info")?;

    let config = Config::load()?;
    let cost = config.hashing_cost();
    let hasher = SecretHasher::with_cost(cost)?;

    tracing::info!(
        iterations = cost.iterations,
        memory_kib = cost.memory_kib,
        parallelism = cost.parallelism,
        "Reading secret from stdin"
    );

    let mut secret = String::new();
    std::io::stdin().lock().read_line(&mut secret)?;
    let secret = secret.trim_end_matches(['\r', '\n']);

    if secret.is_empty() {
        anyhow::bail!("no secret provided on stdin");
    }

    let hash = hasher.hash(secret)?;
    println!("{}", hash.as_str());

    Ok(())
}
