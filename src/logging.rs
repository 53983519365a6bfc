//! Console and CSV progress logging of the boosting rounds.
use colored::Colorize;

use crate::Result;
use crate::booster::RoundReport;
use crate::dataset::CachePlan;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;


const WIDTH: usize = 8;
const PREC_WIDTH: usize = 5;
const FULL_WIDTH: usize = 60;
const STAT_WIDTH: usize = (FULL_WIDTH - 4) / 2;
const HEADER: &str = "Round,Edge,Alpha,Loss,TrainError,Time\n";


/// Prints the progress of a training run to the console
/// and optionally writes one CSV line per committed round.
///
/// The console table shows a row every `print_every` rounds.
/// Set `print_every` to `usize::MAX` to silence the console;
/// warnings are still written to the standard error.
#[derive(Debug)]
pub struct RoundLogger {
    print_every: usize,
    file: Option<BufWriter<File>>,
}


impl RoundLogger {
    /// Returns a logger that prints a row every `print_every` rounds.
    pub fn new(print_every: usize) -> Self {
        Self { print_every: print_every.max(1), file: None }
    }


    /// Also writes the rounds to the CSV file at `path`.
    pub fn log_to<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(HEADER.as_bytes())?;
        self.file = Some(file);
        Ok(self)
    }


    #[inline]
    fn is_silent(&self) -> bool {
        self.print_every == usize::MAX
    }


    /// Prints the current settings.
    pub fn print_stats(
        &self,
        booster: &str,
        booster_info: Option<Vec<(&str, String)>>,
        weak_learner: &str,
        plan: &CachePlan,
    )
    {
        if self.is_silent() { return; }

        let header = format!(
            "{:=>FULL_WIDTH$}\n{:^FULL_WIDTH$}\n{:->FULL_WIDTH$}",
            "", "STATS".bold(), "",
        );
        println!(
            "\n{header}\n\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}",
            "Booster".bold(),
            booster.bold().green(),
        );

        if let Some(info) = booster_info {
            let line = info.into_iter()
                .map(|(key, val)| {
                    format!(
                        "    + {:<STAT_WIDTH$}\t{:>width$}",
                        key,
                        val.bold().yellow(),
                        width = STAT_WIDTH - 8
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            println!("{line}");
        }

        println!(
            "\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            {:=^FULL_WIDTH$}\n\
            ",
            "Weak Learner".bold(),
            weak_learner.bold().green(),
            "Cache".bold(),
            plan.to_string().bold().green(),
            "".bold(),
        );
    }


    /// Prints the header of the progress table.
    pub fn print_header(&self) {
        if self.is_silent() { return; }

        println!(
            "      {:>WIDTH$}\t{:>WIDTH$}\t{:>WIDTH$}\t{:>WIDTH$}\t{:>WIDTH$}\t{:>WIDTH$}",
            "".bold().red(),
            "".bold().blue(),
            "".bold().green(),
            "".bold().yellow(),
            "TRAIN".bold().magenta(),
            "".bold().cyan(),
        );
        println!(
            "      {:>WIDTH$}\t{:>WIDTH$}\t{:>WIDTH$}\t{:>WIDTH$}\t{:>WIDTH$}\t{:>WIDTH$}\n",
            "ROUND".bold().red(),
            "EDGE".bold().blue(),
            "ALPHA".bold().green(),
            "LOSS".bold().yellow(),
            "ERR".bold().magenta(),
            "TIME".bold().cyan(),
        );
    }


    /// Records a committed round.
    pub fn record(&mut self, report: &RoundReport) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            let line = format!(
                "{},{},{},{},{},{}\n",
                report.round,
                report.edge,
                report.alpha,
                report.loss,
                report.train_error,
                report.elapsed.as_millis(),
            );
            file.write_all(line.as_bytes())?;
        }

        if !self.is_silent() && report.round % self.print_every == 0 {
            self.print_row("[LOG]".bold().magenta(), report);
        }
        Ok(())
    }


    /// Prints the last committed round, if any, and flushes the CSV file.
    pub fn finish(&mut self, last: Option<&RoundReport>) -> Result<()> {
        if let (Some(report), false) = (last, self.is_silent()) {
            self.print_row("[FIN]".bold().bright_green(), report);
            println!();
        }
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }


    /// Reports an abnormal but recoverable condition.
    pub fn warn(&self, message: &str) {
        eprintln!("{} {message}", "[WARN]".bold().yellow());
    }


    /// Reports a noteworthy event.
    pub fn notice(&self, message: &str) {
        if self.is_silent() { return; }
        println!("{} {message}", "[NOTE]".bold().cyan());
    }


    fn print_row(&self, tag: colored::ColoredString, report: &RoundReport) {
        println!(
            "{} {}\t{}\t{}\t{}\t{}\t{}",
            tag,
            format!("{:>WIDTH$}", report.round).red(),
            format!("{:>WIDTH$.PREC_WIDTH$}", report.edge).blue(),
            format!("{:>WIDTH$.PREC_WIDTH$}", report.alpha).green(),
            format!("{:>WIDTH$.PREC_WIDTH$}", report.loss).yellow(),
            format!("{:>WIDTH$.PREC_WIDTH$}", report.train_error).magenta(),
            time_format(report.elapsed).bold().cyan(),
        );
    }
}


fn time_format(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    let (sec, millis) = (millis / 1_000, millis % 1_000);
    if sec < 60 {
        return format!(" {sec:0>2}.{millis:0>3}s");
    }
    let (min, sec) = (sec / 60, sec % 60);
    if min < 60 {
        return format!(" {min:0>2}m {sec:0>2}s");
    }
    format!(" {:0>2}h {:0>2}m", min / 60, min % 60)
}
