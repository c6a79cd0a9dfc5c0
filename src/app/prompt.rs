use std::io::{self, BufRead, Write};

/// Blocking yes/no question. Anything but `y`/`yes` (including EOF) declines.
pub fn confirm<R: BufRead, W: Write>(
    assume_yes: bool,
    question: &str,
    input: &mut R,
    out: &mut W,
) -> io::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    write!(out, "{question} [y/N] ")?;
    out.flush()?;
    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(out)?;
        return Ok(false);
    }
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
