//! Integration tests for module compilation and playback
//!
//! These tests build MOD files in memory, compile them to cartridges and run
//! the player over the resulting memory image.

use flate2::write::GzEncoder;
use flate2::Compression;
use modtic::cart::TicCartridge;
use modtic::config::{chunk, BuildConfig};
use modtic::modfile::note::note_to_period;
use modtic::player::{read_registers, Player};
use modtic::report::BuildReport;
use modtic::wavetable::{SampleMeta, FRAME_SIZE};
use modtic::{CompiledSong, Compiler, Error};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

const PATTERN_SIZE: usize = 64 * 4 * 4;

/// One cell of a pattern: row, channel, note, sample, effect, param
type Cell = (usize, usize, u8, u8, u8, u8);

/// Build a 4-channel M.K. module with one pattern
fn build_mod(samples: &[(Vec<i8>, u16, u16)], cells: &[Cell]) -> Vec<u8> {
    let mut data = vec![0u8; 20];
    data[..8].copy_from_slice(b"testsong");

    for i in 0..31 {
        let mut header = [0u8; 30];
        if let Some((pcm, repeat_from, repeat_length)) = samples.get(i) {
            header[..6].copy_from_slice(b"sample");
            header[22..24].copy_from_slice(&((pcm.len() / 2) as u16).to_be_bytes());
            header[25] = 64;
            header[26..28].copy_from_slice(&(repeat_from / 2).to_be_bytes());
            header[28..30].copy_from_slice(&(repeat_length / 2).to_be_bytes());
        }
        data.extend_from_slice(&header);
    }

    data.push(1); // song length
    data.push(0x7F);
    data.extend_from_slice(&[0u8; 128]);
    data.extend_from_slice(b"M.K.");

    let mut pattern = vec![0u8; PATTERN_SIZE];
    for &(row, ch, note, sample, effect, param) in cells {
        let period = note_to_period(note).unwrap();
        let cell = &mut pattern[(row * 4 + ch) * 4..][..4];
        cell[0] = (sample & 0xF0) | (period >> 8) as u8;
        cell[1] = period as u8;
        cell[2] = (sample << 4) | (effect & 0x0F);
        cell[3] = param;
    }
    data.extend_from_slice(&pattern);

    for (pcm, _, _) in samples {
        data.extend(pcm.iter().map(|&s| s as u8));
    }
    data
}

/// Square wave with a 50-sample period at half scale
fn square(len: usize) -> Vec<i8> {
    (0..len).map(|i| if i % 50 < 25 { 64 } else { -64 }).collect()
}

fn simple_song() -> Vec<u8> {
    build_mod(
        &[(square(2000), 0, 0)],
        &[(0, 0, 29, 1, 0, 0), (1, 2, 29, 1, 0x0C, 32)],
    )
}

/// Helper to compile a module file and read the cartridge back
fn compile_and_read(input: &Path) -> (CompiledSong, TicCartridge) {
    let dir = tempdir().unwrap();
    let output = dir.path().join("song.tic");

    let song = Compiler::new()
        .compile_file(input, &output, None)
        .expect("Compilation failed");

    let data = std::fs::read(&output).expect("Failed to read output cartridge");
    let cart = TicCartridge::from_bytes(&data).expect("Failed to parse cartridge");
    (song, cart)
}

// =============================================================================
// Build Tests
// =============================================================================

#[test]
fn test_build_writes_tiles_chunk() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("song.mod");
    std::fs::write(&input, simple_song()).unwrap();

    let (song, cart) = compile_and_read(&input);

    assert_eq!(song.title, "testsong");
    assert_eq!(song.instruments.len(), 31);
    // (2000 - 368) / 184 + 1
    assert_eq!(song.samples_meta[0].length, 9);
    assert_eq!(song.samples_meta[0].base_note, 29);
    assert_eq!(song.layout.events_len, PATTERN_SIZE);
    assert_eq!(song.layout.frames_len(), 9 * FRAME_SIZE);

    assert_eq!(cart.chunks().len(), 1);
    let tiles = cart.chunk(chunk::TILES).unwrap();
    assert_eq!(tiles.data.len(), PATTERN_SIZE + 9 * FRAME_SIZE);

    // First packed frame: 222 Hz at amplitude 8
    let frame = &tiles.data[PATTERN_SIZE..PATTERN_SIZE + 2];
    assert_eq!(frame, &[222, 0x80]);
}

#[test]
fn test_gzip_input() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("song.mod.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&simple_song()).unwrap();
    std::fs::write(&input, encoder.finish().unwrap()).unwrap();

    let (song, cart) = compile_and_read(&input);
    assert_eq!(song.samples_meta[0].length, 9);
    assert!(cart.chunk(chunk::TILES).is_some());
}

/// Read `samples_meta` rows and `positions` back from generated Lua
fn parse_lua_tables(code: &str) -> (Vec<SampleMeta>, Vec<u8>) {
    let numbers = |s: &str| -> Vec<usize> {
        s.split(',').map(|v| v.trim().parse().unwrap()).collect()
    };
    let metas: Vec<SampleMeta> = code
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with('{') && l.ends_with("},"))
        .map(|l| {
            let v = numbers(&l[1..l.len() - 2]);
            SampleMeta {
                start: v[0],
                length: v[1],
                repeat_from: v[2],
                repeat_length: v[3],
                base_note: v[4] as u8,
            }
        })
        .collect();
    let positions: Vec<u8> = code
        .lines()
        .find_map(|l| l.strip_prefix("positions = {"))
        .map(|l| numbers(l.trim_end_matches('}')).into_iter().map(|p| p as u8).collect())
        .unwrap();
    (metas, positions)
}

#[test]
fn test_code_chunk_carries_tables() {
    let script = "-- title: song\n-- script: lua\nfunction TIC() end\n";
    let song = Compiler::new().compile_bytes(&simple_song()).unwrap();
    let cart = song.cartridge(Some(script.as_bytes())).unwrap();
    let parsed = TicCartridge::from_bytes(&cart.to_bytes()).unwrap();
    assert_eq!(parsed.chunks()[0].tag, chunk::CODE);
    assert_eq!(parsed.chunks()[1].tag, chunk::TILES);

    let code = String::from_utf8(parsed.chunks()[0].data.clone()).unwrap();
    assert!(code.starts_with("-- title: song\n-- script: lua\n"));
    assert!(code.ends_with("function TIC() end\n"));
    assert!(code.contains(&format!("sample_data_start = 0x{:04X}", 0x4000 + PATTERN_SIZE)));

    let (metas, positions) = parse_lua_tables(&code);
    assert_eq!(metas, song.samples_meta);
    assert_eq!(positions, song.positions);
}

#[test]
fn test_base_note_from_pattern_usage() {
    let data = build_mod(
        &[(square(2000), 0, 0)],
        &[(0, 0, 24, 1, 0, 0), (1, 0, 36, 1, 0, 0)],
    );
    let song = Compiler::new().compile_bytes(&data).unwrap();
    assert_eq!(song.samples_meta[0].base_note, 30);
    // Unused instruments keep the reference note
    assert_eq!(song.samples_meta[1].base_note, 29);
}

#[test]
fn test_report_json() {
    let song = Compiler::new().compile_bytes(&simple_song()).unwrap();
    let json = serde_json::to_value(BuildReport::new(&song)).unwrap();
    assert_eq!(json["format"], "M.K.");
    assert_eq!(json["instruments"][0]["base_note"], "F-2");
    assert_eq!(json["instruments"][0]["frames"], 9);
    assert_eq!(json["total_bytes"], PATTERN_SIZE + 9 * FRAME_SIZE);
    assert_eq!(json["budget"], 49152);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_unsupported_format() {
    let mut data = simple_song();
    data[1080..1084].copy_from_slice(b"8CHN");
    assert!(matches!(
        Compiler::new().compile_bytes(&data),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_over_budget_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("song.mod");
    let output = dir.path().join("song.tic");
    let config_path = dir.path().join("small.toml");
    std::fs::write(&input, simple_song()).unwrap();
    std::fs::write(&config_path, "budget = 1100\n").unwrap();

    let config = BuildConfig::load(&config_path).unwrap();
    let result = Compiler::with_config(config).compile_file(&input, &output, None);
    match result {
        Err(Error::CapacityExceeded { actual, budget }) => {
            assert_eq!(actual, PATTERN_SIZE + 9 * FRAME_SIZE);
            assert_eq!(budget, 1100);
        }
        other => panic!("expected CapacityExceeded, got {:?}", other.map(|s| s.title)),
    }
    assert!(!output.exists());
}

#[test]
fn test_invalid_config() {
    assert!(matches!(
        BuildConfig::from_toml("regions = []\n"),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        BuildConfig::from_toml("bogus = 1\n"),
        Err(Error::Config(_))
    ));
}

// =============================================================================
// Playback Tests
// =============================================================================

#[test]
fn test_playback_of_compiled_song() {
    let song = Compiler::new().compile_bytes(&simple_song()).unwrap();
    let mut ram = song.memory();
    let mut player = Player::new(song.tables());

    player.tick(&mut ram);
    let regs = read_registers(&ram, 0);
    assert_eq!(regs.frequency, 222);
    assert_eq!(regs.amplitude, 8);
    assert_eq!(regs.wave, song.instruments[0].frames[0].wave);
    assert_eq!(read_registers(&ram, 2).amplitude, 0);

    // Row 1 starts on tick 8 with the volume effect at half scale
    for _ in 1..9 {
        player.tick(&mut ram);
    }
    assert_eq!(player.state().row, Some(1));
    let regs = read_registers(&ram, 2);
    assert_eq!(regs.frequency, 222);
    assert_eq!(regs.amplitude, 4);

    // Channel 0 has played all nine frames and falls silent
    player.tick(&mut ram);
    assert!(!player.channel(0).is_active());
    assert_eq!(read_registers(&ram, 0).amplitude, 0);
}

#[test]
fn test_playback_loops_sample() {
    // Loop over the second half of the sample
    let data = build_mod(&[(square(2000), 1000, 1000)], &[(0, 0, 29, 1, 0, 0)]);
    let song = Compiler::new().compile_bytes(&data).unwrap();
    let meta = song.samples_meta[0];
    assert_eq!(meta.repeat_from, 5 * FRAME_SIZE);
    assert_eq!(meta.repeat_length, 4);

    let mut ram = song.memory();
    let mut player = Player::new(song.tables());
    for _ in 0..200 {
        player.tick(&mut ram);
        assert!(player.channel(0).is_active());
        assert_eq!(read_registers(&ram, 0).amplitude, 8);
    }
}
