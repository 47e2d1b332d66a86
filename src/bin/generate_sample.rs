use anyhow::{Context, Result};

const INCOME_GROUPS: [&str; 4] = [
    "low_income",
    "lower_middle_income",
    "upper_middle_income",
    "high_income",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// One clean row: income group, age, gender, year, population.
fn clean_row(rng: &mut SimpleRng) -> [String; 5] {
    let income = INCOME_GROUPS[rng.below(INCOME_GROUPS.len() as u64) as usize];
    [
        income.to_string(),
        rng.below(100).to_string(),
        format!("{}.0", 1 + rng.below(2)),
        (1950 + rng.below(75)).to_string(),
        (1_000 + rng.below(9_000_000)).to_string(),
    ]
}

/// Introduce the kinds of defects the cleaner is meant to repair.
fn mess_up(row: &mut [String; 5], rng: &mut SimpleRng) {
    if rng.chance(0.05) {
        row[0].push_str("_typo");
    }
    if rng.chance(0.02) {
        row[2] = "3.0".to_string();
    }
    if rng.chance(0.02) {
        row[3] = (2025 + rng.below(100)).to_string();
    }
    if rng.chance(0.01) {
        row[4] = (5_000_000_000u64 + rng.below(1_000_000_000)).to_string();
    }
    if rng.chance(0.03) {
        // Float-typed year, as left behind by a column that once held NaN
        row[3].push_str(".0");
    }
    if rng.chance(0.04) {
        let col = rng.below(5) as usize;
        row[col].clear();
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = "messy_population_data.csv";

    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("Failed to create {output_path}"))?;
    writer.write_record(["income_groups", "age", "gender", "year", "population"])?;

    let mut written = 0usize;
    let mut previous: Option<[String; 5]> = None;
    for _ in 0..2_000 {
        // Occasionally repeat the previous row verbatim
        let row = match &previous {
            Some(prev) if rng.chance(0.03) => prev.clone(),
            _ => {
                let mut row = clean_row(&mut rng);
                mess_up(&mut row, &mut rng);
                row
            }
        };
        writer.write_record(&row)?;
        written += 1;
        previous = Some(row);
    }
    writer.flush()?;

    println!("Wrote {written} rows to {output_path}");
    Ok(())
}
