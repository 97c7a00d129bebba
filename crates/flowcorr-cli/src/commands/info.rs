use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use flowcorr_core::io::load_stack;
use flowcorr_core::pipeline::EmptyChannelPolicy;

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file, multi-page TIFF or image-sequence directory
    pub path: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let loaded = load_stack(&args.path)
        .with_context(|| format!("Failed to load {}", args.path.display()))?;
    let info = &loaded.info;

    println!("Source:      {}", info.source.display());
    println!("Frames:      {}", info.total_frames);
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Channels:    {}", info.channels);
    println!("Bit depth:   {}", info.bit_depth);

    for channel in 0..loaded.stack.channel_count() {
        let all_zero = loaded
            .stack
            .is_channel_empty(channel, EmptyChannelPolicy::AllZero)?;
        let any_zero = loaded
            .stack
            .is_channel_empty(channel, EmptyChannelPolicy::AnyFrameZero)?;
        let state = if all_zero {
            "empty"
        } else if any_zero {
            "has blank frames"
        } else {
            "ok"
        };
        println!("Channel {}:   {}", channel, state);
    }

    let data_mb = loaded.stack.data().len() as f64 * 4.0 / (1024.0 * 1024.0);
    println!("In memory:   {:.1} MB", data_mb);

    Ok(())
}
