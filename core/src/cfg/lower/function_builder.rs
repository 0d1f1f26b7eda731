use crate::ast::Binding;
use crate::cfg::block::BlockName;
use crate::cfg::graph::ControlFlowGraph;
use crate::cfg::op::{BlockOperand, Instruction, Operand};
use crate::cfg::value::Constant;

/// Block and instruction emission for one graph: a temporary allocator, a
/// block counter, and the block currently receiving instructions.
///
/// After a terminator the builder has no current block. The next emitted
/// instruction opens a fresh one, so code following a `break` or `return`
/// lands in an unreachable block instead of after the terminator.
pub struct FunctionBuilder {
    graph: ControlFlowGraph,
    current: Option<BlockName>,
    next_block: usize,
    next_temp: usize,
}

impl FunctionBuilder {
    pub fn new() -> Self {
        FunctionBuilder {
            graph: ControlFlowGraph::new(),
            current: Some(BlockName::Enter),
            next_block: 1,
            next_temp: 1,
        }
    }

    /// Fresh temporary `%t<n>`. Names are never reused within a graph.
    pub fn alloc_temp(&mut self) -> Binding {
        let t = Binding::temporary(self.next_temp);
        self.next_temp += 1;
        t
    }

    pub fn temp_count(&self) -> usize {
        self.next_temp - 1
    }

    /// Name a block without adding it to the graph yet. The vertex is added
    /// the first time the block is started or targeted.
    pub fn reserve_block(&mut self) -> BlockName {
        let name = BlockName::Numbered(self.next_block);
        self.next_block += 1;
        name
    }

    pub fn create_block(&mut self) -> BlockName {
        let name = self.reserve_block();
        self.graph.add_vertex(name);
        log::trace!("created block {}", name);
        name
    }

    pub fn is_materialized(&self, name: BlockName) -> bool {
        self.graph.contains(name)
    }

    /// Make `name` the current block. An open current block falls through
    /// to it with a jump.
    pub fn start_block(&mut self, name: BlockName) {
        if self.current.is_some() {
            self.jump(name);
        }
        self.graph.add_vertex(name);
        self.current = Some(name);
    }

    /// Detach the current block without terminating it.
    pub fn suspend(&mut self) -> Option<BlockName> {
        self.current.take()
    }

    /// Continue emitting into a block detached by `suspend`.
    pub fn resume(&mut self, block: Option<BlockName>) {
        self.current = block;
    }

    pub fn emit(&mut self, instruction: Instruction) {
        let name = match self.current {
            Some(name) => name,
            None => {
                let name = self.create_block();
                self.current = Some(name);
                name
            }
        };
        let targets = instruction.targets();
        let terminates = instruction.is_terminator();
        if let Some(block) = self.graph.block_mut(name) {
            block.push(instruction);
        }
        for target in targets {
            self.graph.add_vertex(target);
            self.graph.add_edge(name, target);
        }
        if terminates {
            self.current = None;
        }
    }

    pub fn jump(&mut self, target: BlockName) {
        self.emit(Instruction::Jump { target });
    }

    pub fn branch(&mut self, condition: Option<Binding>, if_true: BlockName, if_false: BlockName) {
        self.emit(Instruction::Branch { condition, if_true, if_false });
    }

    pub fn copy(&mut self, dest: Binding, src: Binding) {
        self.emit(Instruction::Assign { dest, src: Operand::Binding(src) });
    }

    pub fn load_const(&mut self, dest: Binding, value: Constant) {
        self.emit(Instruction::Assign { dest, src: Operand::Constant(value) });
    }

    /// Fresh temporary holding `value`.
    pub fn const_temp(&mut self, value: Constant) -> Binding {
        let t = self.alloc_temp();
        self.load_const(t.clone(), value);
        t
    }

    pub fn call(
        &mut self,
        dest: Option<Binding>,
        receiver: Binding,
        method: &str,
        args: Vec<Binding>,
        block: BlockOperand,
    ) {
        self.emit(Instruction::Call { dest, receiver, method: method.to_string(), args, block });
    }

    /// Call into a fresh temporary and return it.
    pub fn call_value(&mut self, receiver: Binding, method: &str, args: Vec<Binding>) -> Binding {
        let t = self.alloc_temp();
        self.call(Some(t.clone()), receiver, method, args, BlockOperand::None);
        t
    }

    pub fn graph(&self) -> &ControlFlowGraph {
        &self.graph
    }

    pub fn finish(self) -> ControlFlowGraph {
        self.graph
    }
}

impl Default for FunctionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
