// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn memory_chunk_encodes_and_decodes() {
    let chunk = MemoryChunk::new(0x1000, &[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(chunk.address, "0x1000");
    assert_eq!(chunk.byte_count, 4);
    assert_eq!(chunk.decode().unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
}

#[test]
fn empty_chunk_is_valid() {
    let chunk = MemoryChunk::new(0, &[]);
    assert_eq!(chunk.byte_count, 0);
    assert!(chunk.decode().unwrap().is_empty());
}

#[test]
fn register_and_instruction_serialize_flat() {
    let reg = Register {
        name: "pc".into(),
        value: "0x401000".into(),
    };
    let json = serde_json::to_value(&reg).unwrap();
    assert_eq!(json["name"], "pc");

    let insn = Instruction {
        address: "0x401000".into(),
        bytes: None,
        text: "mov rax, rdi".into(),
        symbol: None,
    };
    let json = serde_json::to_string(&insn).unwrap();
    assert!(!json.contains("bytes"));
    assert!(!json.contains("symbol"));
}
