//! Prime factorization task: payload factory and output verification.
//!
//! Providers run coreutils `factor`, which prints one `N: p1 p2 ...` line per
//! argument.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use repu_core::{CoreError, RemoteCommand, ResultVerifier, TaskPayload, VerificationError};

/// Number → ascending prime factors.
pub type Factorization = BTreeMap<u64, Vec<u64>>;

const PRIMES_PER_NUMBER: usize = 3;
const MAX_PRIME: u64 = 1_000_000;
const BASE_TIMEOUT_SECS: u64 = 10;

/// Trial division; inputs never exceed `MAX_PRIME`.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

fn random_primes<R: Rng + ?Sized>(rng: &mut R, count: usize, max: u64) -> Vec<u64> {
    let mut primes = Vec::with_capacity(count);
    while primes.len() < count {
        let candidate = rng.gen_range(2..=max);
        if is_prime(candidate) {
            primes.push(candidate);
        }
    }
    primes
}

/// Build a factoring task over `task_size` distinct composite numbers.
pub fn prepare_task_data<R: Rng + ?Sized>(
    task_size: usize,
    rng: &mut R,
) -> Result<TaskPayload, CoreError> {
    if task_size == 0 {
        return Err(CoreError::InvalidInput(
            "task size must be at least 1".to_string(),
        ));
    }

    let mut expected = Factorization::new();
    while expected.len() < task_size {
        let mut primes = random_primes(rng, PRIMES_PER_NUMBER, MAX_PRIME);
        primes.sort_unstable();
        let number: u64 = primes.iter().product();
        expected.entry(number).or_insert(primes);
    }

    let numbers: Vec<String> = expected.keys().map(u64::to_string).collect();
    let command = RemoteCommand::shell(format!("factor {}", numbers.join(" ")));
    let timeout = Duration::from_secs(BASE_TIMEOUT_SECS + task_size as u64);

    Ok(TaskPayload {
        command,
        timeout,
        verifier: Arc::new(FactorizationCheck::new(expected)),
    })
}

/// Render a factorization the way `factor` prints it.
pub fn format_factor_output(factorization: &Factorization) -> String {
    let mut out = String::new();
    for (number, factors) in factorization {
        out.push_str(&number.to_string());
        out.push(':');
        for factor in factors {
            out.push(' ');
            out.push_str(&factor.to_string());
        }
        out.push('\n');
    }
    out
}

/// Parse `factor` output. Blank lines are skipped; anything else that is not
/// `N: p1 p2 ...` fails the whole output.
pub fn parse_factor_output(text: &str) -> Result<Factorization, VerificationError> {
    let mut parsed = Factorization::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let malformed = || VerificationError::MalformedLine {
            line: index + 1,
            content: line.to_string(),
        };

        let (number, factors) = line.split_once(':').ok_or_else(malformed)?;
        let number: u64 = number.trim().parse().map_err(|_| malformed())?;
        let mut factors = factors
            .split_whitespace()
            .map(|f| f.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?;
        factors.sort_unstable();

        if parsed.insert(number, factors).is_some() {
            return Err(malformed());
        }
    }

    Ok(parsed)
}

/// Verifier comparing provider output with a known factorization.
#[derive(Debug, Clone)]
pub struct FactorizationCheck {
    expected: Factorization,
}

impl FactorizationCheck {
    pub fn new(expected: Factorization) -> Self {
        Self { expected }
    }

    pub fn expected(&self) -> &Factorization {
        &self.expected
    }
}

impl ResultVerifier for FactorizationCheck {
    fn verify(&self, stdout: &str) -> Result<(), VerificationError> {
        let received = parse_factor_output(stdout)?;
        if received == self.expected {
            return Ok(());
        }

        let detail = match self
            .expected
            .iter()
            .find(|(number, factors)| received.get(*number) != Some(*factors))
        {
            Some((number, factors)) => format!(
                "{}: expected {:?}, got {:?}",
                number,
                factors,
                received.get(number)
            ),
            None => format!(
                "{} unexpected numbers in output",
                received.len().saturating_sub(self.expected.len())
            ),
        };
        Err(VerificationError::Mismatch(detail))
    }
}
