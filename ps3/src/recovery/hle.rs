use anyhow::{anyhow, Result};
use cell::{Arch, DecodeConfig, DecodeContext, Decoder, Terminator};
use common::Logger;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    Init,
    CheckFlash,
    Menu,
    Done,
}

impl Step {
    fn next(self) -> Option<Step> {
        match self {
            Step::Init => Some(Step::CheckFlash),
            Step::CheckFlash => Some(Step::Menu),
            Step::Menu => Some(Step::Done),
            Step::Done => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EntryBlock {
    pub instructions: usize,
    pub terminator: Terminator,
}

/// What one run of the recovery routine did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub steps: Vec<Step>,
    pub entry_block: Option<EntryBlock>,
}

pub(super) fn run(log: &Logger, firmware: Option<&[u8]>) -> Result<Report> {
    let mut report = Report { steps: Vec::new(), entry_block: None };
    let mut step = Some(Step::Init);

    while let Some(current) = step {
        match current {
            Step::Init => log.info(format_args!("[recovery] basic initialization")),
            Step::CheckFlash => {
                log.info(format_args!("[recovery] checking flash"));
                report.entry_block = match firmware {
                    Some(image) => Some(check_entry(log, image)?),
                    None => {
                        log.warn(format_args!("[recovery] no firmware image, skipping entry check"));
                        None
                    }
                };
            }
            Step::Menu => log.info(format_args!("[recovery] showing menu")),
            Step::Done => log.info(format_args!("[recovery] done")),
        }
        report.steps.push(current);
        step = current.next();
    }
    Ok(report)
}

/// The firmware image is mapped at address zero and entered at its first word.
fn check_entry(log: &Logger, image: &[u8]) -> Result<EntryBlock> {
    let decoder = Decoder::new(DecodeContext::new(Arch::Ppu, 0), DecodeConfig::default(), log.clone());
    let block = decoder
        .decode_block(image)
        .ok_or_else(|| anyhow!("firmware image of {} bytes has no entry instruction", image.len()))?;

    log.info(format_args!("[recovery] entry block: {} instructions, {}", block.len(), block.terminator()));
    Ok(EntryBlock { instructions: block.len(), terminator: block.terminator() })
}
