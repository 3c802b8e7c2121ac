use hashcash::{Minter, Stamp, Verifier, VerifierConfig};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn usage() -> String {
    "Usage: cargo run --release --example mint_bench -- \
      [--resource <str>] [--bits <u32>] [--threads <usize>] [--repeats <u32>] \
      [--max-iterations <u64>] [--verify <stamp>]\n"
        .to_string()
}

fn parse_next<T: FromStr>(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<T, String> {
    let v = it.next().ok_or_else(usage)?;
    v.parse::<T>()
        .map_err(|_| format!("Invalid value for {flag}"))
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let mut resource = String::from("bench@example.org");
    let mut bits: u32 = 16;
    let mut threads: usize = 1;
    let mut repeats: u32 = 3;
    let mut max_iterations: Option<u64> = None;
    let mut to_verify: Option<String> = None;

    while let Some(a) = args.next() {
        match a.as_str() {
            "--resource" => resource = args.next().ok_or_else(usage)?,
            "--bits" => bits = parse_next(&mut args, "--bits")?,
            "--threads" => threads = parse_next(&mut args, "--threads")?,
            "--repeats" => repeats = parse_next(&mut args, "--repeats")?,
            "--max-iterations" => {
                max_iterations = Some(parse_next(&mut args, "--max-iterations")?)
            }
            "--verify" => to_verify = Some(args.next().ok_or_else(usage)?),
            _ => return Err(usage()),
        }
    }

    let verifier = Verifier::new(
        VerifierConfig {
            required_bits: bits,
            ..VerifierConfig::default()
        },
        Arc::new(hashcash::SystemClock),
    )
    .map_err(|e| e.to_string())?;

    if let Some(text) = to_verify {
        let stamp = Stamp::parse(&text).map_err(|e| e.to_string())?;
        match verifier.verify(&stamp, resource.as_str()) {
            Ok(()) => println!("ok,{},{}", stamp.zero_bits(), stamp.digest_hex()),
            Err(err) => println!("rejected,{err}"),
        }
        return Ok(());
    }

    let progress = Arc::new(AtomicU64::new(0));
    let mut builder = Minter::builder()
        .bits(bits)
        .threads(threads)
        .progress(progress.clone());
    if let Some(cap) = max_iterations {
        builder = builder.max_iterations(cap);
    }
    let minter = builder.build_validated().map_err(|e| e.to_string())?;

    println!("kind,bits,threads,run_idx,time_ms,tries,counter,zero_bits,verified,stamp");

    for run_idx in 0..repeats {
        let t0 = Instant::now();
        let stamp = minter.mint(&resource).map_err(|e| e.to_string())?;
        let dt_ms = t0.elapsed().as_millis();
        let verified = verifier.verify(&stamp, resource.as_str()).is_ok();
        println!(
            "run,{},{},{},{},{},{},{},{},{}",
            bits,
            threads,
            run_idx,
            dt_ms,
            progress.load(Ordering::SeqCst),
            stamp.counter(),
            stamp.zero_bits(),
            verified,
            stamp
        );
    }

    Ok(())
}
