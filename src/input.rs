use std::io::{BufRead, Write};

use crate::config::SweepConfig;
use crate::error::{Error, Result};

const PROMPTS: [&str; 3] = [
    "Enter the number of processes on which you want to compare the replacement policies",
    "Enter the RAM size for which you want to compare the replacement policies",
    "Enter the size of the process on which you want to compare the replacement policies",
];

/// Asks for the process count, RAM size and process size, in that order
///
/// Answers are whitespace separated, so all three may also be given on one line
///
/// # Arguments
///
/// * `input`: Where answers are read from, usually locked stdin
/// * `output`: Where prompts are written to, usually stdout
///
/// returns: Result<SweepConfig, Error>
///
/// # Examples
///
/// ```
/// use pagesim::input::prompt_sweep_config;
/// let mut prompts = Vec::new();
/// let config = prompt_sweep_config("5\n64 32\n".as_bytes(), &mut prompts).unwrap();
/// assert_eq!((config.process_count, config.ram_size, config.process_size), (5, 64, 32));
/// ```
pub fn prompt_sweep_config<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<SweepConfig> {
    let mut answers = [0usize; 3];
    let mut pending: Vec<String> = Vec::new();
    for (answer, prompt) in answers.iter_mut().zip(PROMPTS) {
        if pending.is_empty() {
            writeln!(output, "{prompt}")?;
            output.flush()?;
            pending = read_tokens(&mut input)?;
            pending.reverse();
        }
        let token = pending.pop().ok_or_else(|| Error::InvalidConfig("missing input".to_string()))?;
        *answer = token
            .parse()
            .map_err(|e| Error::InvalidConfig(format!("couldn't parse '{token}' as a size: {e}")))?;
    }
    let [process_count, ram_size, process_size] = answers;
    let config = SweepConfig::new(ram_size, process_count, process_size);
    config.validate()?;
    Ok(config)
}

// Reads lines until one has something on it
fn read_tokens<R: BufRead>(input: &mut R) -> Result<Vec<String>> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(Error::InvalidConfig("input ended before every value was given".to_string()));
        }
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if !tokens.is_empty() {
            return Ok(tokens);
        }
    }
}
