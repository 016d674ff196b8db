//! Synthetic iNES images for integration tests.

/// One 16 KiB PRG bank holding `program` at its start (mapped to `$C000`
/// and mirrored at `$8000`), plus 8 KiB of CHR. The reset vector points at
/// `$C000`.
pub fn nrom_image(program: &[u8]) -> Vec<u8> {
    let mut image = vec![b'N', b'E', b'S', 0x1A, 1, 1, 0, 0];
    image.resize(16, 0);

    let mut prg = vec![0u8; 0x4000];
    prg[..program.len()].copy_from_slice(program);
    prg[0x3FFC] = 0x00;
    prg[0x3FFD] = 0xC0;
    image.extend_from_slice(&prg);

    image.extend(std::iter::repeat(0).take(0x2000));
    image
}
