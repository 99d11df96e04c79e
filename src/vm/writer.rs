use super::{ArithmeticOp, Command, Segment};

/// Accumulates stack-machine commands in emission order.
#[derive(Debug, Default)]
pub struct VmWriter {
    commands: Vec<Command>,
}

impl VmWriter {
    pub fn new() -> VmWriter {
        VmWriter::default()
    }

    pub fn push(&mut self, segment: Segment, index: u16) {
        self.commands.push(Command::Push(segment, index));
    }

    pub fn pop(&mut self, segment: Segment, index: u16) {
        self.commands.push(Command::Pop(segment, index));
    }

    pub fn arithmetic(&mut self, op: ArithmeticOp) {
        self.commands.push(Command::Arithmetic(op));
    }

    pub fn label(&mut self, label: &str) {
        self.commands.push(Command::Label(label.to_string()));
    }

    pub fn goto(&mut self, label: &str) {
        self.commands.push(Command::Goto(label.to_string()));
    }

    pub fn if_goto(&mut self, label: &str) {
        self.commands.push(Command::IfGoto(label.to_string()));
    }

    pub fn call(&mut self, name: &str, args: u16) {
        self.commands.push(Command::Call { name: name.to_string(), args });
    }

    pub fn function(&mut self, name: &str, locals: u16) {
        self.commands.push(Command::Function { name: name.to_string(), locals });
    }

    pub fn ret(&mut self) {
        self.commands.push(Command::Return);
    }

    /// Builds a string object holding `text`, one character at a time.
    pub fn string(&mut self, text: &str) {
        let chars = text.chars().collect::<Vec<_>>();

        self.push(Segment::Constant, chars.len() as u16);
        self.call("String.new", 1);

        for ch in chars {
            self.push(Segment::Constant, ch as u32 as u16);
            self.call("String.appendChar", 2);
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn finish(self) -> Vec<Command> {
        self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string() {
        let mut writer = VmWriter::new();
        writer.string("Hi");

        let lines = writer.finish()
            .iter()
            .map(Command::to_string)
            .collect::<Vec<_>>();

        assert_eq!(lines, vec![
            "push constant 2",
            "call String.new 1",
            "push constant 72",
            "call String.appendChar 2",
            "push constant 105",
            "call String.appendChar 2",
        ]);
    }
}
