//! One complete rcc job: lock, decide, act, publish, record.

use std::path::Path;

use crate::error::{RccError, Result};
use crate::evaluate::{BuildDecision, InputSet, StalenessCheck, check_info_file, evaluate};
use crate::generate::generate;
use crate::info::RccInfo;
use crate::lister::{RccLister, ResourceLister};
use crate::settings::{SettingsDigest, SettingsStore};
use crate::timestamp::touch;
use crate::verbose::{quoted, vprintln};
use crate::wrapper::publish;

/// Run the job described by `info` with the real rcc lister.
pub fn run(info: &RccInfo) -> Result<BuildDecision> {
    let lister = RccLister::new(&info.executable, info.list_options.clone());
    process(info, &lister)
}

/// Run the job described by `info`, listing resources through `lister`.
///
/// The settings lock is held from the first read of the settings record
/// until it is written back, and released on every path out of here.
pub fn process(info: &RccInfo, lister: &dyn ResourceLister) -> Result<BuildDecision> {
    let digest = SettingsDigest::compute(&info.digest_parts());
    let settings = SettingsStore::open(&info.settings_file, &info.lock_file, digest)?;

    let result = process_locked(info, lister, settings.changed());
    settings.close(result.is_ok())?;
    result
}

fn process_locked(
    info: &RccInfo,
    lister: &dyn ResourceLister,
    settings_changed: bool,
) -> Result<BuildDecision> {
    let output = info.output_path();

    let check = StalenessCheck {
        output: &output,
        executable: &info.executable,
        settings_changed,
    };
    let mut inputs = InputSet::new(&info.source, info.inputs.clone());
    let decision = evaluate(&check, &mut inputs, lister)?;
    let decision = check_info_file(decision, &output, &info.info_file);

    match &decision {
        BuildDecision::Rebuild(reason) => generate(info, reason)?,
        BuildDecision::TouchOnly => touch_output(&output, &info.info_file)?,
        BuildDecision::UpToDate => {}
    }

    if info.multi_config {
        publish(
            &info.multi_config_output(),
            &info.public_path(),
            decision.changes_output(),
        )?;
    }

    Ok(decision)
}

fn touch_output(output: &Path, info_file: &Path) -> Result<()> {
    vprintln!(
        "Touching {} because it is older than {}",
        quoted(output.display()),
        quoted(info_file.display())
    );
    touch(output).map_err(|e| RccError::io("build file touch failed for", output, e))
}
