//! Canned fixtures shared across unit tests.

/// Symbol-dump output for an object exporting `foo` and `bar`.
pub const SAMPLE_DUMP_FOO_BAR: &str = "\
Microsoft (R) COFF/PE Dumper Version 14.29.30133.0
Copyright (C) Microsoft Corporation.  All rights reserved.

Dump of file a.obj

COFF SYMBOL TABLE
008 00000000 SECT1  notype ()    External     | foo
00A 00000010 SECT1  notype ()    External     | bar
00C 00000020 SECT2  notype       Static       | local_helper
00E 00000000 UNDEF  notype ()    External     | __imp_GetLastError

  Summary
";

/// Symbol-dump output for an object exporting `bar` and `baz`.
pub const SAMPLE_DUMP_BAR_BAZ: &str = "\
Microsoft (R) COFF/PE Dumper Version 14.29.30133.0
Copyright (C) Microsoft Corporation.  All rights reserved.

Dump of file b.obj

COFF SYMBOL TABLE
008 00000000 SECT1  notype ()    External     | bar
00A 00000010 SECT1  notype ()    External     | baz

  Summary
";
