use std::path::Path;

use console::Style;
use flowcorr_core::pipeline::{AnalysisConfig, ChannelAnalysis, FlowConfig, Verdict};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    positive: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            positive: Style::new().green().bold(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_analysis_header(config: &AnalysisConfig, estimator: &str) {
    let s = Styles::new();
    let flow = &config.flow;

    println!();
    println!("  {}", s.title.apply_to("Flow Correlation Analysis"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(25)));
    println!();
    println!("  {:<16}{}", s.label.apply_to("Estimator"), s.method.apply_to(estimator));
    println!("  {:<16}{}", s.label.apply_to("Channels"), s.value.apply_to(config.channel));
    println!(
        "  {:<16}{}",
        s.label.apply_to("Pixel size"),
        s.value.apply_to(format!("{} \u{b5}m", flow.pixel_size))
    );
    println!(
        "  {:<16}{}",
        s.label.apply_to("Stride"),
        s.value.apply_to(format!("{} frame(s)", flow.frame_stride))
    );
    println!(
        "  {:<16}{}",
        s.label.apply_to("Downsample"),
        s.value.apply_to(flow.downsample)
    );
    println!(
        "  {:<16}{}",
        s.label.apply_to("Threshold"),
        s.value.apply_to(format!(
            "> {} \u{b5}m in > {:.0}% of pairs",
            flow.min_corr_len,
            flow.min_fraction * 100.0
        ))
    );
    println!(
        "  {:<16}{}",
        s.label.apply_to("Empty channel"),
        s.value.apply_to(flow.empty_channel)
    );
    println!();
}

pub fn print_channel_results(path: &Path, results: &[ChannelAnalysis], flow: &FlowConfig) {
    let s = Styles::new();

    println!("  {}", s.path.apply_to(path.display()));
    for result in results {
        println!("  {}", s.header.apply_to(format!("Channel {}", result.channel)));
        let verdict = match result.verdict {
            Verdict::Detected => s.positive.apply_to(result.verdict),
            Verdict::NotDetected => s.value.apply_to(result.verdict),
            Verdict::DataUnavailable => s.disabled.apply_to(result.verdict),
        };
        println!("    {:<14}{}", s.label.apply_to("Verdict"), verdict);

        let Some(ref summary) = result.summary else {
            continue;
        };
        println!(
            "    {:<14}{}",
            s.label.apply_to("Organized"),
            s.value.apply_to(format!(
                "{:.1}% of {} pairs",
                summary.fraction_above * 100.0,
                result.pairs.len()
            ))
        );
        println!(
            "    {:<14}{}",
            s.label.apply_to("Direction"),
            s.value.apply_to(format!("{:.1}\u{b0}", summary.mean_direction.to_degrees()))
        );
        println!(
            "    {:<14}{}",
            s.label.apply_to("Speed"),
            s.value.apply_to(format!(
                "{:.3} \u{b5}m/pair",
                summary.mean_speed * flow.pixel_size
            ))
        );
        println!(
            "    {:<14}{}",
            s.label.apply_to("Divergence"),
            s.value.apply_to(format!("{:.4}", summary.mean_divergence))
        );
        let lengths: Vec<String> = result
            .correlation_lengths
            .iter()
            .map(|l| format!("{:.1}", l))
            .collect();
        println!(
            "    {:<14}{}",
            s.label.apply_to("Lengths (\u{b5}m)"),
            lengths.join(" ")
        );
    }
    println!();
}
