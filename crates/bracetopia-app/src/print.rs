//! Bounded text output: the grid and its statistics once per cycle.

use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use bracetopia_core::World;
use tracing::info;

use crate::renderer::{Renderer, RendererContext};

/// Prints the initial grid followed by `count` further cycles to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintRenderer {
    count: u64,
}

impl PrintRenderer {
    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self { count }
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Write `count + 1` frames to `out`, advancing `world` between frames.
    pub fn render_to<W: Write>(&self, world: &mut World, out: &mut W) -> io::Result<()> {
        write_frame(out, world)?;
        for _ in 0..self.count {
            world.step();
            write_frame(out, world)?;
        }
        writeln!(out)?;
        out.flush()
    }
}

impl Renderer for PrintRenderer {
    fn name(&self) -> &'static str {
        "print"
    }

    fn run(&self, ctx: RendererContext<'_>) -> Result<()> {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        self.render_to(ctx.world, &mut out)
            .context("failed to write frames to stdout")?;
        info!(
            frames = self.count + 1,
            final_cycle = ctx.world.cycle(),
            team_happiness = ctx.world.team_happiness(),
            "Print run completed"
        );
        Ok(())
    }
}

/// One frame: the grid, then cycle, moves, team happiness and the
/// configuration line. The configuration line is left unterminated; the next
/// frame's leading newline ends it.
pub fn write_frame<W: Write>(out: &mut W, world: &World) -> io::Result<()> {
    let summary = world.summary();
    write!(out, "\n{}\n", world.grid())?;
    writeln!(out, "cycle: {}", summary.cycle)?;
    writeln!(out, "moves this cycle: {}", summary.moves)?;
    writeln!(out, "teams' \"happiness\": {:.6}", summary.team_happiness)?;
    write!(out, "{}", world.config().summary_line())
}
