use jvm_frames::jvm::code::{BasicBlockGraph, BlockId};
use jvm_frames::jvm::model::Method;
use jvm_frames::jvm::{Compute, Settings};
use jvm_frames::listing::{self, Listing};

fn recompute_maxes(source: &str) -> Listing {
    let mut listing = listing::parse(source).unwrap();
    listing
        .recompute_all(None, &Settings::new(Compute::Maxes))
        .unwrap();
    listing
}

fn method(listing: &Listing, name: &str) -> Method {
    listing
        .classes
        .iter()
        .flat_map(|class| class.methods.iter())
        .find(|method| method.name.to_string() == name)
        .cloned()
        .unwrap()
}

#[test]
fn straight_line_static() {
    let listing = recompute_maxes(
        "
        .class Test
        .method static three()I
            iconst_1
            iconst_2
            iadd
            ireturn
        .end method
        ",
    );
    let code = method(&listing, "three").code_impl.unwrap();
    assert_eq!(code.max_stack, 2);
    assert_eq!(code.max_locals, 0);
}

#[test]
fn parameter_slots() {
    let listing = recompute_maxes(
        "
        .class Test
        .method instance(IJ)V
            return
        .end method
        .method static statik(IJ)V
            return
        .end method
        .method static wide(D)V
            dload_0
            dstore 5
            return
        .end method
        ",
    );

    let instance = method(&listing, "instance");
    assert_eq!(BasicBlockGraph::start_locals(&instance), 4);
    assert_eq!(instance.code_impl.unwrap().max_locals, 4);

    let statik = method(&listing, "statik");
    assert_eq!(BasicBlockGraph::start_locals(&statik), 3);

    let wide = method(&listing, "wide").code_impl.unwrap();
    assert_eq!(wide.max_locals, 7);
    assert_eq!(wide.max_stack, 2);
}

#[test]
fn handler_starts_with_one_slot() {
    let listing = recompute_maxes(
        "
        .class Test
        .method static guarded()V
        start:
            iconst_0
            iconst_0
            iconst_0
            pop2
            pop
        end:
            return
        handler:
            pop
            return
            .catch any from start to end using handler
        .end method
        ",
    );
    let code = method(&listing, "guarded").code_impl.unwrap();
    assert_eq!(code.max_stack, 3);
}

#[test]
fn branches_take_the_deepest_path() {
    let listing = recompute_maxes(
        "
        .class Test
        .method static pick(I)J
            iload_0
            ifeq small
            lconst_1
            lconst_1
            ladd
            lreturn
        small:
            lconst_0
            lreturn
        .end method
        ",
    );
    let code = method(&listing, "pick").code_impl.unwrap();
    assert_eq!(code.max_stack, 4);
    assert_eq!(code.max_locals, 1);
}

#[test]
fn growing_stack_loop_terminates() {
    // Malformed: every trip around the loop leaves one more value on the stack
    let listing = recompute_maxes(
        "
        .class Test
        .method static grow()V
        top:
            iconst_0
            goto top
        .end method
        ",
    );
    let code = method(&listing, "grow").code_impl.unwrap();
    assert!(code.max_stack <= 6);
}

#[test]
fn underflow_is_tolerated() {
    let listing = recompute_maxes(
        "
        .class Test
        .method static broken()V
            pop
            pop
            iconst_0
            return
        .end method
        ",
    );
    let code = method(&listing, "broken").code_impl.unwrap();
    assert_eq!(code.max_stack, 1);
}

#[test]
fn maxes_are_idempotent() {
    let listing = listing::parse(
        "
        .class Test
        .method static count(I)I
            iconst_0
            istore_1
        top:
            iload_1
            iload_0
            if_icmpge done
            iinc 1 1
            goto top
        done:
            iload_1
            ireturn
        .end method
        ",
    )
    .unwrap();
    let method = method(&listing, "count");
    let code = method.code_impl.as_ref().unwrap();

    let mut graph = BasicBlockGraph::new(code);
    let start_locals = BasicBlockGraph::start_locals(&method);
    let first = graph.compute_maxes(start_locals);
    let second = graph.compute_maxes(start_locals);
    assert_eq!(first, second);
    assert_eq!(first.max_stack, 2);
    assert_eq!(first.max_locals, 2);
}

#[test]
fn if_else_blocks() {
    let listing = listing::parse(
        "
        .class Test
        .method static choose(Z)I
            iload_0
            ifeq other
            iconst_1
            goto merge
        other:
            iconst_2
        merge:
            ireturn
        .end method
        ",
    )
    .unwrap();
    let method = method(&listing, "choose");
    let code = method.code_impl.as_ref().unwrap();
    let graph = BasicBlockGraph::new(code);
    let blocks = graph.blocks();

    assert!(blocks.len() >= 3);
    let merge = graph.block_containing(code.instructions.len() - 1).unwrap();
    assert_eq!(merge, BlockId(blocks.len() - 1));
    assert!(blocks[merge.0].needs_frame);
    assert!(!blocks[0].needs_frame);
}
