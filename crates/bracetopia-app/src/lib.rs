//! Shared application plumbing for the bracetopia command-line driver.

pub mod cli;
pub mod print;
pub mod terminal;

pub mod renderer {
    use anyhow::Result;
    use bracetopia_core::World;

    /// State lent to a renderer for the duration of its session.
    pub struct RendererContext<'a> {
        pub world: &'a mut World,
    }

    pub trait Renderer {
        /// Stable identifier describing the renderer implementation (e.g., "print", "terminal").
        fn name(&self) -> &'static str;

        /// Launch the renderer; blocks until the rendering session completes.
        fn run(&self, ctx: RendererContext<'_>) -> Result<()>;
    }
}

pub use cli::{Cli, DEFAULT_DELAY_MICROS};
pub use print::PrintRenderer;
pub use terminal::TerminalRenderer;
