use std::iter::FromIterator;

use hack::{
    assembler::assemble,
    emulator::{Emulator, SparseMemory, Ticks},
    translator::{translate, TranslateOptions, STACK_BASE},
    vm::parse_program,
};

const LCL: u16 = 300;
const ARG: u16 = 400;
const THIS: u16 = 3000;
const THAT: u16 = 3010;

/// Translates and assembles `source`, then runs it with the segment registers set.
fn run(source: &str, ticks: Ticks) -> Emulator<SparseMemory> {
    let program = parse_program(source).expect("could not parse commands");
    let lines = translate(&program, &TranslateOptions::unit("Test"))
        .expect("could not translate commands");
    let assembly = assemble(&lines.join("\n"))
        .expect("could not assemble");

    let memory = SparseMemory::from_iter(vec![
        (0, STACK_BASE),
        (1, LCL),
        (2, ARG),
        (3, THIS),
        (4, THAT),
    ]);

    let mut emulator = Emulator::new(&assembly.program, memory);
    emulator.run(ticks).expect("could not run the program");
    emulator
}

#[test]
fn test_add_leaves_one_value() {
    let emulator = run("push constant 7\npush constant 8\nadd", Ticks::Unbounded);

    assert_eq!(emulator.memory.get(0), STACK_BASE + 1);
    assert_eq!(emulator.memory.get(STACK_BASE), 15);
}

#[test]
fn test_call_restores_the_frame() {
    let emulator = run(include_str!("programs/frames.vm"), Ticks::Limited(500));

    // One argument pushed, one return value left behind.
    assert_eq!(emulator.memory.get(0), STACK_BASE + 1);
    assert_eq!(emulator.memory.get(STACK_BASE), 42);

    assert_eq!(emulator.memory.get(1), LCL);
    assert_eq!(emulator.memory.get(2), ARG);
    assert_eq!(emulator.memory.get(3), THIS);
    assert_eq!(emulator.memory.get(4), THAT);
}

#[test]
fn test_comparisons() {
    let source = "\
        push constant 3\npush constant 5\nlt\n\
        push constant 5\npush constant 5\neq\n\
        push constant 3\npush constant 5\ngt\n\
        push constant 5\npush constant 3\ngt\n";

    let emulator = run(source, Ticks::Unbounded);

    assert_eq!(emulator.memory.get(0), STACK_BASE + 4);
    assert_eq!(emulator.memory.get(STACK_BASE), 0xFFFF);
    assert_eq!(emulator.memory.get(STACK_BASE + 1), 0xFFFF);
    assert_eq!(emulator.memory.get(STACK_BASE + 2), 0);
    assert_eq!(emulator.memory.get(STACK_BASE + 3), 0xFFFF);
}

#[test]
fn test_segments() {
    let source = "\
        push constant 10\npop local 2\n\
        push constant 11\npop argument 1\n\
        push constant 12\npop this 3\n\
        push constant 13\npop that 4\n\
        push constant 14\npop temp 6\n\
        push constant 15\npop static 0\n\
        push local 2\npush temp 6\nadd\n\
        push static 0\nsub\n\
        not\nneg\n";

    let emulator = run(source, Ticks::Unbounded);

    assert_eq!(emulator.memory.get(LCL + 2), 10);
    assert_eq!(emulator.memory.get(ARG + 1), 11);
    assert_eq!(emulator.memory.get(THIS + 3), 12);
    assert_eq!(emulator.memory.get(THAT + 4), 13);
    assert_eq!(emulator.memory.get(11), 14);
    assert_eq!(emulator.memory.get(16), 15);

    // -(!(10 + 14 - 15)) = 10
    assert_eq!(emulator.memory.get(0), STACK_BASE + 1);
    assert_eq!(emulator.memory.get(STACK_BASE), 10);
}

#[test]
fn test_pointer_moves_this_and_that() {
    let emulator = run("push constant 5000\npop pointer 0\npush constant 6000\npop pointer 1\npush constant 9\npop that 0", Ticks::Unbounded);

    assert_eq!(emulator.memory.get(3), 5000);
    assert_eq!(emulator.memory.get(4), 6000);
    assert_eq!(emulator.memory.get(6000), 9);
}

#[test]
fn test_if_goto_loop() {
    // Sums 1..=4 into local 0.
    let source = "\
        function Test.sum 0\n\
        push constant 4\npop local 1\n\
        label LOOP\n\
        push local 0\npush local 1\nadd\npop local 0\n\
        push local 1\npush constant 1\nsub\npop local 1\n\
        push local 1\nif-goto LOOP\n";

    let emulator = run(source, Ticks::Unbounded);

    assert_eq!(emulator.memory.get(LCL), 10);
    assert_eq!(emulator.memory.get(LCL + 1), 0);
}
