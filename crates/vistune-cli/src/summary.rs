use std::time::Duration;

use console::Style;
use vistune_core::pipeline::config::PipelineConfig;
use vistune_core::pipeline::PopulateSummary;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
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
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_config_summary(config: &PipelineConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Vistune Pipeline"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(16)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Store"),
        s.path.apply_to(config.store.path.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Master"),
        s.method.apply_to(&config.compute.master)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Platform"),
        s.method.apply_to(config.compute.platform())
    );
    println!();

    println!("  {}", s.header.apply_to("Registration"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Flyline rows"),
        s.value.apply_to(config.registration.flyline_rows)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Target cut"),
        s.value.apply_to(format!("{:.0}th percentile", config.registration.cut_cc))
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Upsample"),
        s.value.apply_to(config.registration.upsample)
    );
    println!();

    println!("  {}", s.header.apply_to("Segmentation"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Components"),
        s.value.apply_to(config.segmentation.n_comp)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Mask cut"),
        s.value.apply_to(format!("{:.0}th percentile", config.segmentation.px_threshold))
    );
    println!();

    println!("  {}", s.header.apply_to("Tuning"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Baseline"),
        s.value.apply_to(format!(
            "{:.0}th pct, window {}, step {}",
            config.timecourse.percentile, config.timecourse.baseline_window, config.timecourse.step
        ))
    );
    if config.timecourse.use_cache {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Cache"),
            s.method.apply_to("reuse tc.toml")
        );
    } else {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Cache"),
            s.disabled.apply_to("disabled")
        );
    }
    println!(
        "    {:<14}{}",
        s.label.apply_to("Significance"),
        s.value.apply_to(format!("p < {}", config.tuning.sig_th))
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Angle cutoff"),
        s.value.apply_to(format!("{} deg", config.tuning.angle_cutoff))
    );
    println!();
}

pub fn print_populate_summary(table: &str, summary: &PopulateSummary, elapsed: Duration) {
    let s = Styles::new();

    println!();
    if summary.keys == 0 {
        println!(
            "  {:<14}{}",
            s.header.apply_to(table),
            s.disabled.apply_to("nothing pending")
        );
    } else {
        println!("  {}", s.header.apply_to(table));
        println!(
            "    {:<14}{}",
            s.label.apply_to("Keys"),
            s.value.apply_to(summary.keys)
        );
        println!(
            "    {:<14}{}",
            s.label.apply_to("Rows"),
            s.value.apply_to(summary.rows)
        );
    }
    println!(
        "    {:<14}{}",
        s.label.apply_to("Elapsed"),
        s.value.apply_to(format!("{:.1}s", elapsed.as_secs_f64()))
    );
    println!();
}
