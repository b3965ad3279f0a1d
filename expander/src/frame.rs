use daphne::directive::Marker;

/// The kind of block a frame was opened by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    If,
    ForEach,
}

impl Control {
    pub fn from_keyword(keyword: &str) -> Option<Control> {
        match keyword {
            "if" => Some(Control::If),
            "foreach" => Some(Control::ForEach),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Control::If => "if",
            Control::ForEach => "foreach",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    True,
    False,
}

/// An open block and the raw lines collected for it so far.
#[derive(Debug, Clone)]
pub struct Frame {
    pub control: Control,
    pub condition: String,
    pub true_branch: Vec<String>,
    pub false_branch: Vec<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub reading: Branch,
    /// Open markers seen inside a loop body that are still waiting for
    /// their close.
    pub nested: usize,
}

impl Frame {
    pub fn open(control: Control, condition: &str, start_line: usize) -> Self {
        Frame {
            control,
            condition: condition.to_string(),
            true_branch: Vec::new(),
            false_branch: Vec::new(),
            start_line,
            end_line: start_line,
            reading: Branch::True,
            nested: 0,
        }
    }

    pub fn buffer(&mut self, line: String) {
        match self.reading {
            Branch::True => self.true_branch.push(line),
            Branch::False => self.false_branch.push(line),
        }
    }

    pub fn into_branch(self, condition_holds: bool) -> Vec<String> {
        if condition_holds {
            self.true_branch
        } else {
            self.false_branch
        }
    }

    /// Bookkeeping for a marker seen inside a loop body. Returns true when the
    /// marker closes this loop rather than a block nested inside it.
    pub fn closes_loop(&mut self, marker: Option<&Marker<'_>>) -> bool {
        match marker {
            Some(Marker::Open { .. }) => {
                self.nested += 1;
                false
            }
            Some(Marker::Close(_)) if self.nested > 0 => {
                self.nested -= 1;
                false
            }
            Some(Marker::Close(keyword)) => *keyword == self.control.keyword(),
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Hand a raw line to the top frame, if any.
    pub fn buffer(&mut self, line: String) {
        if let Some(frame) = self.top_mut() {
            frame.buffer(line);
        }
    }
}
