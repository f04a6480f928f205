fn main() {
    seqbench_e2e_tests::main();
}
