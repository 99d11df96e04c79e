use std::iter::FromIterator;

use hack::{
    assembler::{assemble, AssembleError},
    bytecode::Program,
    emulator::{Emulator, SparseMemory, Ticks},
    symbolic,
};

const MAX: &str = include_str!("programs/Max.asm");

#[test]
fn test_output_has_one_word_per_instruction() {
    let assembly = assemble(MAX).unwrap();

    let expected = MAX.lines()
        .map(symbolic::parser::clean_line)
        .filter(|line| !line.is_empty() && !line.starts_with('('))
        .count();

    assert_eq!(assembly.program.len(), expected);
    assert_eq!(assembly.program.len(), 16);
}

#[test]
fn test_labels_ignore_blank_lines_and_comments() {
    let padded = MAX.lines()
        .flat_map(|line| vec![line.to_string(), String::new(), "// padding".to_string()])
        .collect::<Vec<_>>()
        .join("\n");

    let plain = assemble(MAX).unwrap();
    let padded = assemble(&padded).unwrap();

    assert_eq!(plain.program, padded.program);

    for label in &["OUTPUT_FIRST", "OUTPUT_D", "INFINITE_LOOP"] {
        assert_eq!(plain.symbols.address(label), padded.symbols.address(label));
    }

    assert_eq!(plain.symbols.address("OUTPUT_FIRST"), Some(10));
    assert_eq!(plain.symbols.address("OUTPUT_D"), Some(12));
    assert_eq!(plain.symbols.address("INFINITE_LOOP"), Some(14));
}

#[test]
fn test_binary_text_round_trip() {
    let assembly = assemble(MAX).unwrap();
    let text = assembly.program.to_string();

    assert_eq!(Program::parse(&text).unwrap(), assembly.program);
    assert!(text.lines().all(|line| line.len() == 16));
}

#[test]
fn test_max_runs() {
    let assembly = assemble(MAX).unwrap();

    for &(first, second) in &[(3u16, 9u16), (12, 4), (7, 7)] {
        let memory = SparseMemory::from_iter(vec![(0, first), (1, second)]);
        let mut emulator = Emulator::new(&assembly.program, memory);
        emulator.run(Ticks::Limited(40)).unwrap();

        assert_eq!(emulator.memory.get(2), first.max(second));
    }
}

#[test]
fn test_variables_are_dense_and_reused() {
    let assembly = assemble("@a\n@b\n@a\n@R3\n@c\n").unwrap();

    assert_eq!(assembly.program.words, vec![16, 17, 16, 3, 18]);
}

#[test]
fn test_unknown_destination() {
    match assemble("@1\nMX=D\n") {
        Err(AssembleError::Encoding { line: 2, found, .. }) => assert_eq!(found, "MX"),
        other => panic!("unexpected result {:?}", other.map(|assembly| assembly.program)),
    }
}
