/// Aggregated counters for a monitor run.
#[derive(Debug, Default)]
pub struct WatchStats {
    pub cycles: u32,
    pub comments_fetched: u32,
    pub rows_normalized: u32,
    pub rows_appended: u32,
    pub duplicates_skipped: u32,
    pub state_save_failures: u32,
}

impl std::fmt::Display for WatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Monitor Run Summary ===")?;
        writeln!(f, "Cycles completed:    {}", self.cycles)?;
        writeln!(f, "Comments fetched:    {}", self.comments_fetched)?;
        writeln!(f, "Rows normalized:     {}", self.rows_normalized)?;
        writeln!(f, "Rows appended:       {}", self.rows_appended)?;
        writeln!(f, "Duplicates skipped:  {}", self.duplicates_skipped)?;
        write!(f, "State save failures: {}", self.state_save_failures)
    }
}
