use common::Logger;

use crate::block::{BasicBlock, BlockAssembler, State};
use crate::context::{Arch, DecodeConfig, DecodeContext};
use crate::ir::{InstrIR, INSTRUCTION_BYTES};
use crate::ppu::Ppu;
use crate::spu::Spu;

/// One instruction set. Implemented by zero-sized strategy types so the block loop is
/// monomorphised per architecture.
pub trait Isa {
    const ARCH: Arch;

    /// Decodes one word. Never fails: unmapped encodings become `OpKind::Unknown`.
    fn decode(word: u32, address: u64) -> InstrIR;
}

/// Turns code buffers into basic blocks.
///
/// Holds only configuration; decoding never mutates it, so one decoder can be shared by
/// any number of threads.
#[derive(Debug, Clone)]
pub struct Decoder {
    ctx: DecodeContext,
    config: DecodeConfig,
    log: Logger,
}

impl Decoder {
    pub fn new(ctx: DecodeContext, config: DecodeConfig, log: Logger) -> Self {
        Self { ctx, config, log }
    }

    pub fn context(&self) -> DecodeContext {
        self.ctx
    }

    pub fn config(&self) -> DecodeConfig {
        self.config
    }

    pub fn decode_instruction(&self, word: u32, address: u64) -> InstrIR {
        match self.ctx.arch {
            Arch::Ppu => Ppu::decode(word, address),
            Arch::Spu => Spu::decode(word, address),
        }
    }

    /// Decodes the block at the start of `code`, which sits at the context's base address.
    ///
    /// `None` if `code` does not hold a single full word.
    pub fn decode_block(&self, code: &[u8]) -> Option<BasicBlock> {
        self.assemble(code, self.ctx.base)
    }

    /// Decodes the block at guest `address` of an image mapped at the context's base address.
    ///
    /// `None` if `address` lies outside the image or is not word aligned relative to the base.
    pub fn decode_block_at(&self, image: &[u8], address: u64) -> Option<BasicBlock> {
        let offset = address.checked_sub(self.ctx.base)?;
        if offset % INSTRUCTION_BYTES != 0 {
            return None;
        }
        self.assemble(image.get(usize::try_from(offset).ok()?..)?, address)
    }

    /// Walks `image` linearly, each block starting where the previous one ended.
    pub fn blocks<'a>(&'a self, image: &'a [u8]) -> Blocks<'a> {
        Blocks { decoder: self, image, offset: 0 }
    }

    fn assemble(&self, code: &[u8], start: u64) -> Option<BasicBlock> {
        match self.ctx.arch {
            Arch::Ppu => self.assemble_with::<Ppu>(code, start),
            Arch::Spu => self.assemble_with::<Spu>(code, start),
        }
    }

    fn assemble_with<I: Isa>(&self, code: &[u8], start: u64) -> Option<BasicBlock> {
        let mut asm = BlockAssembler::new(I::ARCH, start, self.config);

        for chunk in code.chunks_exact(INSTRUCTION_BYTES as usize) {
            let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let ir = I::decode(word, asm.cursor());
            if ir.kind().is_unknown() {
                self.log.debug(format_args!("{}: unknown instruction {:#010x} at {:#x}",
                    I::ARCH.name(), word, ir.address()));
            }

            match asm.push(ir) {
                Ok(State::Accumulating) => {}
                Ok(State::Terminated(_)) | Err(_) => break,
            }
        }

        let block = asm.finish()?;
        self.log.debug(format_args!("{}: block {:#x}..{:#x}, {} instructions, {}",
            I::ARCH.name(), block.start(), block.end(), block.len(), block.terminator()));
        Some(block)
    }
}

/// Iterator returned by [`Decoder::blocks`].
pub struct Blocks<'a> {
    decoder: &'a Decoder,
    image: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = BasicBlock;

    fn next(&mut self) -> Option<BasicBlock> {
        let code = self.image.get(self.offset..)?;
        let start = self.decoder.ctx.base.wrapping_add(self.offset as u64);
        let block = self.decoder.assemble(code, start)?;
        self.offset += block.byte_len() as usize;
        Some(block)
    }
}

/// Decodes the block at the start of `code` with the default configuration.
///
/// Empty when `code` is shorter than one instruction.
pub fn decode_block(ctx: DecodeContext, code: &[u8]) -> Vec<InstrIR> {
    Decoder::new(ctx, DecodeConfig::default(), Logger::default())
        .decode_block(code)
        .map(BasicBlock::into_instrs)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::block::Terminator;
    use crate::context::UnknownPolicy;
    use crate::ir::OpKind;
    use common::BufferSink;

    fn words(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    fn decoder(ctx: DecodeContext) -> Decoder {
        Decoder::new(ctx, DecodeConfig::default(), Logger::default())
    }

    #[test]
    fn ppu_nop_then_return() {
        let instrs = decode_block(DecodeContext::ppu(0x1_0000), &words(&[0x6000_0000, 0x4e80_0020]));
        assert_eq!(instrs.len(), 2);
        assert_eq!(instrs[0].kind(), OpKind::Nop);
        assert!(instrs[0].operands().is_empty());
        assert_eq!(instrs[0].address(), 0x1_0000);
        assert_eq!(instrs[1].kind(), OpKind::Return);
        assert!(instrs[1].operands().is_empty());
        assert_eq!(instrs[1].address(), 0x1_0004);

        let block = decoder(DecodeContext::ppu(0)).decode_block(&words(&[0x6000_0000, 0x4e80_0020])).unwrap();
        assert_eq!(block.terminator(), Terminator::Return);
    }

    #[test]
    fn spu_nop_then_return() {
        let code = words(&[0x4020_0000, 0x3500_0000]);
        let block = decoder(DecodeContext::spu(0)).decode_block(&code).unwrap();
        let kinds = block.instrs().iter().map(|ir| ir.kind()).collect::<Vec<_>>();
        assert_eq!(kinds, vec![OpKind::Nop, OpKind::Return]);
        assert!(block.instrs().iter().all(|ir| ir.operands().is_empty()));
        assert_eq!(block.terminator(), Terminator::Return);
    }

    #[test]
    fn short_input() {
        assert!(decode_block(DecodeContext::ppu(0), &[]).is_empty());
        assert!(decode_block(DecodeContext::ppu(0), &[0x60, 0, 0]).is_empty());
        assert!(decode_block(DecodeContext::spu(0), &[0x40]).is_empty());
    }

    #[test]
    fn trailing_partial_word_is_ignored() {
        let mut code = words(&[0x6000_0000]);
        code.extend_from_slice(&[0x4e, 0x80]);
        let block = decoder(DecodeContext::ppu(0)).decode_block(&code).unwrap();
        assert_eq!(block.len(), 1);
        assert_eq!(block.terminator(), Terminator::EndOfInput);
    }

    #[test]
    fn zero_word() {
        let code = words(&[0]);
        let instrs = decode_block(DecodeContext::ppu(0), &code);
        assert_eq!(instrs.len(), 1);
        assert_eq!(instrs[0].kind(), OpKind::Unknown { raw: 0 });

        let ppu = decoder(DecodeContext::ppu(0));
        assert_eq!(ppu.decode_block(&code).unwrap().terminator(), Terminator::Unknown);

        let config = DecodeConfig::default().with_unknown_policy(UnknownPolicy::Continue);
        let lenient = Decoder::new(DecodeContext::ppu(0), config, Logger::default());
        assert_eq!(lenient.decode_block(&code).unwrap().terminator(), Terminator::EndOfInput);

        let block = lenient.decode_block(&words(&[0, 0x6000_0000, 0x4e80_0020])).unwrap();
        assert_eq!(block.len(), 3);
        assert_eq!(block.terminator(), Terminator::Return);

        let spu = decoder(DecodeContext::spu(0)).decode_block(&code).unwrap();
        assert_eq!(spu.instrs()[0].kind(), OpKind::Trap);
        assert_eq!(spu.terminator(), Terminator::Trap);
    }

    #[test]
    fn unknown_words_are_logged() {
        let sink = Arc::new(BufferSink::new());
        let decoder = Decoder::new(DecodeContext::ppu(0x100), DecodeConfig::default(), Logger::new(sink.clone()));
        decoder.decode_block(&words(&[0x0400_0000]));
        assert!(sink.contains("unknown instruction 0x04000000 at 0x100"));
        assert!(sink.contains("1 instructions, unknown"));
    }

    #[test]
    fn decode_at_address() {
        let image = words(&[0x3860_0001, 0x4e80_0020, 0x3860_0002, 0x4800_0008]);
        let decoder = decoder(DecodeContext::ppu(0x8000));

        let block = decoder.decode_block_at(&image, 0x8008).unwrap();
        assert_eq!(block.start(), 0x8008);
        assert_eq!(block.instrs()[0].raw(), 0x3860_0002);
        assert_eq!(block.branch_target(), Some(0x8014));

        assert!(decoder.decode_block_at(&image, 0x7ffc).is_none());
        assert!(decoder.decode_block_at(&image, 0x8010).is_none());
        assert!(decoder.decode_block_at(&image, 0x800e).is_none());
        assert!(decoder.decode_block_at(&image, 0x8002).is_none());
        assert!(decoder.decode_block_at(&image, 0x8005).is_none());
    }

    #[test]
    fn linear_walk() {
        let image = words(&[0x3860_0001, 0x4e80_0020, 0x3860_0002, 0x4800_0008, 0x6000_0000]);
        let blocks = decoder(DecodeContext::ppu(0)).blocks(&image).collect::<Vec<_>>();
        let summary = blocks.iter().map(|b| (b.start(), b.len(), b.terminator())).collect::<Vec<_>>();
        assert_eq!(summary, vec![
            (0x0, 2, Terminator::Return),
            (0x8, 2, Terminator::Branch),
            (0x10, 1, Terminator::EndOfInput),
        ]);
    }

    #[test]
    fn conditional_traps_fall_through() {
        let ppu = decoder(DecodeContext::ppu(0x1000));

        let block = ppu.decode_block(&words(&[0x0f03_0000])).unwrap(); // twnei r3, 0
        assert_eq!(block.terminator(), Terminator::Trap);
        assert_eq!(block.fallthrough(), Some(0x1004));
        assert_eq!(&block.successors()[..], &[0x1004]);

        let block = ppu.decode_block(&words(&[0x7fe0_0008])).unwrap(); // trap
        assert_eq!(block.fallthrough(), None);
        assert!(block.successors().is_empty());

        let spu = decoder(DecodeContext::spu(0x3_fffc));
        let block = spu.decode_block(&words(&[0x7f00_0180])).unwrap(); // heqi $3, 0
        assert_eq!(block.terminator(), Terminator::Trap);
        assert_eq!(block.fallthrough(), Some(0));

        let block = spu.decode_block(&words(&[0x0000_2000])).unwrap(); // stop 0x2000
        assert_eq!(block.fallthrough(), None);
    }

    #[test]
    fn size_cap_splits_blocks() {
        let config = DecodeConfig::default().with_max_instructions(2);
        let decoder = Decoder::new(DecodeContext::spu(0), config, Logger::default());
        let image = words(&[0x4020_0000; 5]);
        let blocks = decoder.blocks(&image).collect::<Vec<_>>();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].terminator(), Terminator::SizeLimit);
        assert_eq!(blocks[0].end(), blocks[1].start());
        assert_eq!(blocks[2].terminator(), Terminator::EndOfInput);
    }

    #[test]
    fn shared_between_threads() {
        let image = words(&[0x3864_002a, 0x8061_0008, 0x7c64_2a14, 0x4182_0010, 0x4e80_0020, 0x4400_0002]);
        let decoder = decoder(DecodeContext::ppu(0x1000));
        let expected = decoder.blocks(&image).collect::<Vec<_>>();

        std::thread::scope(|scope| {
            let handles = (0..4)
                .map(|_| scope.spawn(|| decoder.blocks(&image).collect::<Vec<_>>()))
                .collect::<Vec<_>>();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
