use crate::config::Config;
use anyhow::{Context, Result};
use intervention::ControlledIntervention;
use rmp_serde::encode;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

pub struct Manager {
    cfg: Config,
    analyzer: ControlledIntervention,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(config_file: P) -> Result<Self> {
        let cfg = Config::from_file(config_file).context("failed to construct cfg")?;
        log::info!(
            "loaded {} observations, {} covariates",
            cfg.series.len(),
            cfg.covariates.len()
        );

        let analyzer = cfg
            .build_analyzer()
            .context("failed to construct analyzer")?;
        log::info!("intervention at position {}", analyzer.cut());

        Ok(Self { cfg, analyzer })
    }

    pub fn print_report(&self) -> Result<()> {
        let report = self.analyzer.report().context("failed to compute analysis")?;

        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(report.as_bytes())
            .context("failed to write report")?;
        Ok(())
    }

    pub fn save_plot<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        self.analyzer
            .plot(self.cfg.title())
            .save(file)
            .with_context(|| format!("failed to write {file:?}"))?;
        log::info!("wrote {file:?}");
        Ok(())
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let analysis = self.analyzer.analyze().context("failed to compute analysis")?;

        let file = file.as_ref();
        let handle = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(handle);

        encode::write_named(&mut writer, &analysis).context("failed to serialize analysis")?;
        writer.flush().context("failed to flush results")?;
        log::info!("wrote {file:?}");
        Ok(())
    }
}
