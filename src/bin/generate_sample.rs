//! Write a small, deterministic demo run: two band exports and a pull-down
//! export as CSV, with human / mouse / unclassified contaminants mixed in.
//!
//! ```text
//! cargo run --bin generate_sample -- demo
//! cargo run -- -b demo/band1.csv --mw 10000,60000 -b demo/band2.csv --mw 30000,90000 \
//!     -p demo/pulldown.csv
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// One identified protein of the simulated proteome.
struct Protein {
    accession: String,
    gene: String,
    mw: u32,
}

fn proteome(rng: &mut SimpleRng) -> Vec<Protein> {
    let mut proteins = Vec::new();
    for i in 0..60 {
        proteins.push(Protein {
            accession: format!("P9WG{i:02}_MYCTU"),
            gene: format!("Rv{:04}", 100 + i * 17),
            mw: rng.uniform(8_000.0, 120_000.0) as u32,
        });
    }
    for (i, organism) in ["HUMAN", "HUMAN", "MOUSE", "BOVIN", "HUMAN", "MOUSE"]
        .iter()
        .enumerate()
    {
        proteins.push(Protein {
            accession: format!("Q{i:04}_{organism}"),
            gene: format!("CONT{i}"),
            mw: rng.uniform(10_000.0, 90_000.0) as u32,
        });
    }
    proteins
}

fn write_band(path: &Path, proteins: &[&Protein], rng: &mut SimpleRng) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record([
        "accession",
        "gene_name",
        "description",
        "protein_set_score",
        "coverage",
        "MW",
    ])?;
    for p in proteins {
        w.write_record([
            p.accession.clone(),
            p.gene.clone(),
            format!("Protein {} OS=Mycobacterium tuberculosis", p.gene),
            format!("{:.2}", rng.uniform(20.0, 900.0)),
            format!("{:.1}", rng.uniform(2.0, 80.0)),
            p.mw.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_pulldown(path: &Path, proteins: &[Protein], rng: &mut SimpleRng) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record([
        "accession",
        "gene_name",
        "description",
        "protein_set_score",
        "coverage",
        "MW",
        "ratio_g1_vs_g2",
        "t-test_g1_vs_g2",
    ])?;
    for (i, p) in proteins.iter().enumerate() {
        // A few exact zeros exercise the plot sentinels.
        let ratio = if i % 23 == 5 { 0.0 } else { 2f64.powf(rng.uniform(-4.0, 6.0)) };
        let p_value = if i % 19 == 7 { 0.0 } else { 10f64.powf(-rng.uniform(0.0, 4.0)) };
        w.write_record([
            p.accession.clone(),
            p.gene.clone(),
            format!("Protein {} OS=Mycobacterium tuberculosis", p.gene),
            format!("{:.2}", rng.uniform(20.0, 900.0)),
            format!("{:.1}", rng.uniform(2.0, 80.0)),
            p.mw.to_string(),
            format!("{ratio:.4}"),
            format!("{p_value:.6}"),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demo"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let proteins = proteome(&mut rng);

    // Overlapping random subsets, contaminants included in both.
    let mut band1 = Vec::new();
    let mut band2 = Vec::new();
    for p in &proteins {
        if rng.next_f64() < 0.45 {
            band1.push(p);
        }
        if rng.next_f64() < 0.45 {
            band2.push(p);
        }
    }

    write_band(&out_dir.join("band1.csv"), &band1, &mut rng)?;
    write_band(&out_dir.join("band2.csv"), &band2, &mut rng)?;
    write_pulldown(&out_dir.join("pulldown.csv"), &proteins, &mut rng)?;

    println!(
        "Wrote band1.csv ({} proteins), band2.csv ({} proteins) and pulldown.csv ({} proteins) to {}",
        band1.len(),
        band2.len(),
        proteins.len(),
        out_dir.display()
    );
    Ok(())
}
